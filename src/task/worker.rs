// 该文件是 Kanjian （看见） 项目的一部分。
// src/task/worker.rs - 逐帧处理与后台工作线程
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

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  detect::{DetectionFilter, Overlay},
  labels::LabelMap,
  model::{Model, SsdOutputs},
  output::draw::Draw,
};

const WORKER_THREAD_NAME: &str = "videoThread";

/// 送入帧处理线程的消息
#[derive(Debug)]
pub enum FrameEvent {
  /// 新采集到的一帧
  Frame(RgbImage),
  /// 开始/停止绘制，对正在处理的帧不起作用
  SetCapture(bool),
  Shutdown,
}

/// 画好检测框的一帧
#[derive(Debug, Clone)]
pub struct RenderedFrame {
  pub index: u64,
  pub image: RgbImage,
  pub overlays: Vec<Overlay>,
}

/// 处理一条消息的结果
#[derive(Debug)]
pub enum Outcome {
  Rendered(RenderedFrame),
  /// 停止绘制期间收到的帧，直接丢弃
  Paused,
  CaptureChanged(bool),
  Stopped,
}

/// 持有模型、标签和绘制参数的单帧处理器，所有状态都在这里。
pub struct FrameProcessor<M> {
  model: M,
  labels: LabelMap,
  filter: DetectionFilter,
  draw: Draw,
  capturing: bool,
  frame_index: u64,
}

impl<M> FrameProcessor<M>
where
  M: Model<Output = SsdOutputs>,
  M::Input: for<'a> From<&'a RgbImage>,
{
  pub fn new(model: M, labels: LabelMap) -> Self {
    Self {
      model,
      labels,
      filter: DetectionFilter::default(),
      draw: Draw::default(),
      capturing: true,
      frame_index: 0,
    }
  }

  pub fn with_filter(mut self, filter: DetectionFilter) -> Self {
    self.filter = filter;
    self
  }

  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  pub fn is_capturing(&self) -> bool {
    self.capturing
  }

  pub fn handle(&mut self, event: FrameEvent) -> Result<Outcome, M::Error> {
    match event {
      FrameEvent::Frame(image) => {
        self.frame_index += 1;
        if !self.capturing {
          debug!("已停止绘制，丢弃第 {} 帧", self.frame_index);
          return Ok(Outcome::Paused);
        }
        self.process_frame(image).map(Outcome::Rendered)
      }
      FrameEvent::SetCapture(capturing) => {
        info!("绘制状态: {}", if capturing { "开启" } else { "停止" });
        self.capturing = capturing;
        Ok(Outcome::CaptureChanged(capturing))
      }
      FrameEvent::Shutdown => Ok(Outcome::Stopped),
    }
  }

  /// 转换、推理、筛选、绘制，结果画在采集帧本身上。
  pub fn process_frame(&mut self, mut image: RgbImage) -> Result<RenderedFrame, M::Error> {
    let now = std::time::Instant::now();
    let input = M::Input::from(&image);
    let outputs = self.model.infer(&input)?;
    let elapsed = now.elapsed();

    let overlays = self
      .filter
      .filter(&outputs, &self.labels, image.width(), image.height());
    self.draw.draw_overlays(&mut image, &overlays);
    debug!(
      "第 {} 帧: {} 个检测，推理耗时 {:.2?} / 总耗时 {:.2?}",
      self.frame_index,
      overlays.len(),
      elapsed,
      now.elapsed()
    );

    Ok(RenderedFrame {
      index: self.frame_index,
      image,
      overlays,
    })
  }
}

#[derive(Error, Debug)]
pub enum WorkerError<E> {
  #[error("帧处理失败: {0}")]
  Process(E),
  #[error("工作线程异常退出")]
  Panicked,
}

/// 独占一个后台线程的帧处理器。
///
/// 消息按到达顺序排队处理，不合并也不丢帧。
pub struct FrameWorker<E> {
  events: Sender<FrameEvent>,
  handle: JoinHandle<Result<(), E>>,
}

impl<E: Send + 'static> FrameWorker<E> {
  pub fn spawn<M>(
    mut processor: FrameProcessor<M>,
  ) -> std::io::Result<(Self, Receiver<RenderedFrame>)>
  where
    M: Model<Output = SsdOutputs, Error = E> + Send + 'static,
    M::Input: for<'a> From<&'a RgbImage>,
  {
    let (events, event_rx) = mpsc::channel::<FrameEvent>();
    let (rendered_tx, rendered) = mpsc::channel::<RenderedFrame>();

    let handle = thread::Builder::new()
      .name(WORKER_THREAD_NAME.to_string())
      .spawn(move || -> Result<(), E> {
        info!("帧处理线程启动");
        for event in event_rx {
          match processor.handle(event)? {
            Outcome::Rendered(frame) => {
              if rendered_tx.send(frame).is_err() {
                warn!("显示端已关闭，帧处理线程退出");
                break;
              }
            }
            Outcome::Stopped => break,
            Outcome::Paused | Outcome::CaptureChanged(_) => {}
          }
        }
        info!("帧处理线程退出");
        Ok(())
      })?;

    Ok((Self { events, handle }, rendered))
  }

  pub fn sender(&self) -> Sender<FrameEvent> {
    self.events.clone()
  }

  /// 线程已退出时返回 `false`
  pub fn send(&self, event: FrameEvent) -> bool {
    self.events.send(event).is_ok()
  }

  pub fn is_finished(&self) -> bool {
    self.handle.is_finished()
  }

  /// 请求退出并等待线程结束，已排队的帧会先处理完。
  pub fn join(self) -> Result<(), WorkerError<E>> {
    let _ = self.events.send(FrameEvent::Shutdown);
    drop(self.events);
    match self.handle.join() {
      Ok(result) => result.map_err(WorkerError::Process),
      Err(_) => Err(WorkerError::Panicked),
    }
  }
}

/// 显示端，只保留最近一次画好的帧。
#[derive(Debug, Default)]
pub struct OverlayView {
  current: Option<RenderedFrame>,
}

impl OverlayView {
  pub fn update(&mut self, frame: RenderedFrame) {
    self.current = Some(frame);
  }

  /// 取走所有已到达的帧，只留下最后一帧，返回新到达的数量。
  pub fn poll(&mut self, rendered: &Receiver<RenderedFrame>) -> usize {
    let mut received = 0;
    while let Ok(frame) = rendered.try_recv() {
      self.update(frame);
      received += 1;
    }
    received
  }

  pub fn current(&self) -> Option<&RenderedFrame> {
    self.current.as_ref()
  }
}
