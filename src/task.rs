// 该文件是 Kanjian （看见） 项目的一部分。
// src/task.rs - 检测任务
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

use std::sync::mpsc::{self, Receiver};
use std::{thread, time::Duration};

use image::RgbImage;
use tracing::{info, warn};

use crate::{
  detect::Overlay,
  model::{Model, SsdOutputs},
  output::Render,
};

mod worker;
pub use self::worker::{
  FrameEvent, FrameProcessor, FrameWorker, Outcome, OverlayView, RenderedFrame, WorkerError,
};

// 收到中断后等待这么久仍未退出则强制结束进程
const FORCE_EXIT_AFTER: Duration = Duration::from_secs(30);

pub trait Task<I, P, O>: Sized {
  type Error;
  fn run_task(self, input: I, processor: P, output: O) -> Result<(), Self::Error>;
}

/// 只处理第一帧，在当前线程完成。
pub struct OneShotTask;

impl<I, M, O> Task<I, FrameProcessor<M>, O> for OneShotTask
where
  I: Iterator<Item = RgbImage>,
  M: Model<Output = SsdOutputs>,
  M::Input: for<'a> From<&'a RgbImage>,
  M::Error: std::error::Error + Send + Sync + 'static,
  O: Render<RgbImage, [Overlay]>,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    mut processor: FrameProcessor<M>,
    output: O,
  ) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = std::time::Instant::now();
    let rendered = processor.process_frame(frame)?;
    info!(
      "推理完成，检测到 {} 个物体，耗时: {:.2?}",
      rendered.overlays.len(),
      now.elapsed()
    );
    for overlay in &rendered.overlays {
      info!("  - {} @ {:?}", overlay.text(), overlay.rect);
    }
    output.render_result(&rendered.image, &rendered.overlays)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 把输入帧逐个送入后台帧处理线程，在当前线程把画好的帧交给输出端。
#[derive(Default)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  handle_interrupt: bool,
  controls: Option<Receiver<FrameEvent>>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 安装 Ctrl-C 处理，每个进程只能安装一次。
  pub fn with_interrupt(mut self, handle_interrupt: bool) -> Self {
    self.handle_interrupt = handle_interrupt;
    self
  }

  /// 外部控制消息（如开始/停止绘制），每送入一帧前转发给处理线程。
  pub fn with_controls(mut self, controls: Receiver<FrameEvent>) -> Self {
    self.controls = Some(controls);
    self
  }
}

fn install_interrupt() -> anyhow::Result<Receiver<()>> {
  let (tx, rx) = mpsc::channel();
  ctrlc::set_handler(move || {
    info!("收到中断信号，准备退出...");
    let _ = tx.send(());
    thread::spawn(|| {
      thread::sleep(FORCE_EXIT_AFTER);
      warn!("强制退出程序");
      std::process::exit(1);
    });
  })?;
  Ok(rx)
}

impl<I, M, O> Task<I, FrameProcessor<M>, O> for ContinuousTask
where
  I: Iterator<Item = RgbImage>,
  M: Model<Output = SsdOutputs> + Send + 'static,
  M::Input: for<'a> From<&'a RgbImage>,
  M::Error: std::error::Error + Send + Sync + 'static,
  O: Render<RgbImage, [Overlay]>,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, processor: FrameProcessor<M>, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let interrupt = if self.handle_interrupt {
      Some(install_interrupt()?)
    } else {
      None
    };

    let (worker, rendered) = FrameWorker::spawn(processor)?;
    let mut view = OverlayView::default();
    let present = |frame: RenderedFrame, view: &mut OverlayView| -> anyhow::Result<()> {
      output.render_result(&frame.image, &frame.overlays)?;
      view.update(frame);
      Ok(())
    };

    let mut frame_index = 0usize;
    for frame in input {
      if interrupt.as_ref().is_some_and(|rx| rx.try_recv().is_ok()) {
        warn!("中断信号接收，退出任务循环");
        break;
      }
      let forwarded = self
        .controls
        .iter()
        .flat_map(Receiver::try_iter)
        .all(|event| worker.send(event));
      if !forwarded {
        warn!("帧处理线程已退出，停止转发控制消息");
        break;
      }

      frame_index += 1;
      info!("送入第 {} 帧图像", frame_index);
      if !worker.send(FrameEvent::Frame(frame)) {
        warn!("帧处理线程已退出");
        break;
      }

      while let Ok(frame) = rendered.try_recv() {
        present(frame, &mut view)?;
      }

      if self.frame_number.is_some_and(|n| frame_index >= n) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
    }

    // 处理线程排空队列后关闭发送端，这里随之结束
    let sender = worker.sender();
    let _ = sender.send(FrameEvent::Shutdown);
    drop(sender);
    for frame in rendered.iter() {
      present(frame, &mut view)?;
    }
    worker.join()?;

    match view.current() {
      Some(frame) => info!("任务完成，最后显示第 {} 帧", frame.index),
      None => info!("任务完成，没有画出任何帧"),
    }
    Ok(())
  }
}
