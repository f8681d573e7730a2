// 该文件是 Kanjian （看见） 项目的一部分。
// src/bin/simple_oneshot.rs - 单帧检测
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use kanjian::{
  FromUrl,
  detect::DetectionFilter,
  input::InputWrapper,
  labels::LabelMap,
  model::ModelWrapper,
  output::{OutputWrapper, draw::Draw},
  task::{FrameProcessor, OneShotTask, Task},
};
use tracing::info;

/// 对单张图片做一次检测
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型地址
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 标签文件
  #[arg(long, value_name = "FILE")]
  pub labels: PathBuf,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 置信度阈值
  #[arg(long, value_name = "THRESHOLD")]
  pub threshold: Option<f32>,
  /// 标注文字使用的字体
  #[arg(long, value_name = "FONT")]
  pub font: PathBuf,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型地址: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let labels = LabelMap::load(&args.labels)?;
  let model = ModelWrapper::from_url(&args.model)?;
  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let mut filter = DetectionFilter::default();
  if let Some(threshold) = args.threshold {
    filter = filter.with_threshold(threshold);
  }
  let draw = Draw::with_font_file(&args.font)?;
  let processor = FrameProcessor::new(model, labels)
    .with_filter(filter)
    .with_draw(draw);

  OneShotTask.run_task(input, processor, output)?;

  Ok(())
}
