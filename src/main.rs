// 该文件是 Kanjian （看见） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use kanjian::{
  FromUrl,
  detect::DetectionFilter,
  input::InputWrapper,
  labels::LabelMap,
  model::ModelWrapper,
  output::{OutputWrapper, draw::Draw},
  task::{ContinuousTask, FrameEvent, FrameProcessor, Task},
};

fn parse_command(line: &str) -> Option<FrameEvent> {
  match line.trim() {
    "stop" => Some(FrameEvent::SetCapture(false)),
    "start" | "resume" => Some(FrameEvent::SetCapture(true)),
    "quit" => Some(FrameEvent::Shutdown),
    _ => None,
  }
}

fn spawn_stdin_controls() -> Result<Receiver<FrameEvent>> {
  let (tx, rx) = mpsc::channel();
  thread::Builder::new()
    .name("stdinControl".to_string())
    .spawn(move || {
      for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        match parse_command(&line) {
          Some(event) => {
            info!("控制命令: {:?}", event);
            if tx.send(event).is_err() {
              break;
            }
          }
          None => warn!("未知命令: {}", line.trim()),
        }
      }
    })?;
  Ok(rx)
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型地址: {}", args.model);
  info!("标签文件: {}", args.labels.display());
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("置信度阈值: {}", args.threshold);

  let labels = LabelMap::load(&args.labels)?;
  info!("共 {} 个标签", labels.len());
  let model = ModelWrapper::from_url(&args.model)?;
  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let draw = Draw::with_font_file(&args.font)?;
  let filter = DetectionFilter::default()
    .with_threshold(args.threshold)
    .with_color_by(args.color_by);
  let processor = FrameProcessor::new(model, labels)
    .with_filter(filter)
    .with_draw(draw);

  let mut task = ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_interrupt(true);
  if args.stdin_control {
    task = task.with_controls(spawn_stdin_controls()?);
  }
  task.run_task(input, processor, output)?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn commands_map_to_events() {
    assert!(matches!(
      parse_command("stop\n"),
      Some(FrameEvent::SetCapture(false))
    ));
    assert!(matches!(
      parse_command(" start"),
      Some(FrameEvent::SetCapture(true))
    ));
    assert!(matches!(parse_command("quit"), Some(FrameEvent::Shutdown)));
    assert!(parse_command("pause please").is_none());
  }

  #[test]
  fn font_is_required() {
    let base = [
      "kanjian",
      "--model",
      "replay:///tmp/outputs.jsonl",
      "--labels",
      "/tmp/labels.txt",
      "--input",
      "folder:///tmp/frames",
      "--output",
      "image:///tmp/out.png",
    ];
    assert!(args::Args::try_parse_from(base).is_err());

    let args = args::Args::try_parse_from(base.into_iter().chain(["--font", "/tmp/font.ttf"]))
      .unwrap();
    assert_eq!(args.font, std::path::PathBuf::from("/tmp/font.ttf"));
    assert_eq!(args.threshold, 0.5);
  }
}
