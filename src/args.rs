// 该文件是 Kanjian （看见） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use kanjian::detect::{ColorBy, DEFAULT_SCORE_THRESHOLD};
use url::Url;

/// Kanjian 连续检测参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型地址
  /// 支持格式:
  /// - 回放: replay:///path/to/outputs.jsonl
  /// - ONNX: onnx:///path/to/ssd.onnx[?locations=0&classes=1&scores=2&count=3]
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 标签文件，每行一个类别名称
  #[arg(long, value_name = "FILE")]
  pub labels: PathBuf,

  /// 输入来源
  /// - 图片: image:///path/to/frame.png
  /// - 目录: folder:///path/to/frames
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径
  /// - 图片: image:///path/to/out.png
  /// - 目录: folder:///path/to/records?record=name&always
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 置信度阈值，高于该值的候选才会绘制
  #[arg(long, default_value_t = DEFAULT_SCORE_THRESHOLD, value_name = "THRESHOLD")]
  pub threshold: f32,

  /// 检测框取色方式: slot 或 class
  #[arg(long, default_value = "slot", value_name = "MODE")]
  pub color_by: ColorBy,

  /// 标注文字使用的 TTF/OTF 字体
  #[arg(long, value_name = "FONT")]
  pub font: PathBuf,

  /// 最大处理帧数
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,

  /// 从标准输入读取控制命令: stop / start / quit
  #[arg(long)]
  pub stdin_control: bool,
}
