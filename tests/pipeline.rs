// 该文件是 Kanjian （看见） 项目的一部分。
// tests/pipeline.rs - 检测流水线集成测试
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

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{Rgb, RgbImage};
use kanjian::{
  detect::{DetectionFilter, Overlay, hit_test},
  frame::RgbNhwcFrame,
  labels::LabelMap,
  model::{Model, ReplayModel, SsdOutputs},
  output::{DirectoryRecordOutput, RecordKind, Render},
  task::{ContinuousTask, FrameEvent, FrameProcessor, FrameWorker, OneShotTask, OverlayView, Task},
};

type SmallFrame = RgbNhwcFrame<8, 8>;

fn person_outputs() -> SsdOutputs {
  SsdOutputs {
    scores: vec![0.9, 0.3],
    locations: vec![0.1, 0.2, 0.5, 0.6, 0.0, 0.0, 0.0, 0.0],
    classes: vec![1.0, 1.0],
    count: 2.0,
  }
}

fn empty_outputs() -> SsdOutputs {
  SsdOutputs {
    scores: vec![0.2],
    locations: vec![0.0, 0.0, 1.0, 1.0],
    classes: vec![1.0],
    count: 1.0,
  }
}

fn labels() -> LabelMap {
  LabelMap::parse("???\nperson\nbicycle\n")
}

fn frame() -> RgbImage {
  RgbImage::from_pixel(100, 200, Rgb([255, 255, 255]))
}

fn processor(records: Vec<SsdOutputs>) -> FrameProcessor<ReplayModel<SmallFrame>> {
  FrameProcessor::new(ReplayModel::from_records(records).unwrap(), labels())
}

fn assert_close(actual: f32, expected: f32) {
  assert!((actual - expected).abs() < 1e-3, "{actual} != {expected}");
}

#[derive(Default)]
struct Collect {
  frames: Mutex<Vec<usize>>,
}

impl Render<RgbImage, [Overlay]> for Collect {
  type Error = Infallible;

  fn render_result(&self, _frame: &RgbImage, result: &[Overlay]) -> Result<(), Self::Error> {
    self.frames.lock().unwrap().push(result.len());
    Ok(())
  }
}

impl Render<RgbImage, [Overlay]> for &Collect {
  type Error = Infallible;

  fn render_result(&self, frame: &RgbImage, result: &[Overlay]) -> Result<(), Self::Error> {
    (**self).render_result(frame, result)
  }
}

#[derive(Debug, thiserror::Error)]
#[error("推理失败")]
struct InferenceFailed;

struct FailingModel;

impl Model for FailingModel {
  type Input = SmallFrame;
  type Output = SsdOutputs;
  type Error = InferenceFailed;

  fn infer(&mut self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Err(InferenceFailed)
  }
}

#[test]
fn one_confident_detection_maps_to_pixels() {
  let overlays = DetectionFilter::default().filter(&person_outputs(), &labels(), 100, 200);
  assert_eq!(overlays.len(), 1);

  let overlay = &overlays[0];
  assert_eq!(overlay.slot, 0);
  assert_eq!(overlay.label, "person");
  assert_close(overlay.rect.left, 20.0);
  assert_close(overlay.rect.top, 20.0);
  assert_close(overlay.rect.right, 60.0);
  assert_close(overlay.rect.bottom, 100.0);
  assert!(overlay.text().starts_with("person 0.9"));

  assert!(hit_test(&overlays, 40.0, 50.0).is_some());
  assert!(hit_test(&overlays, 80.0, 50.0).is_none());
}

#[test]
fn only_scores_above_threshold_survive() {
  let scores = [0.0, 0.49, 0.5, 0.5001, 0.75, 1.0, f32::NAN];
  let outputs = SsdOutputs {
    locations: vec![0.0, 0.0, 1.0, 1.0].repeat(scores.len()),
    classes: vec![2.0; scores.len()],
    count: scores.len() as f32,
    scores: scores.to_vec(),
  };
  let overlays = DetectionFilter::default().filter(&outputs, &labels(), 10, 10);
  let kept = overlays.iter().map(|o| o.slot).collect::<Vec<_>>();
  assert_eq!(kept, vec![3, 4, 5]);
  assert!(overlays.iter().all(|o| o.score > 0.5));

  let strict = DetectionFilter::default().with_threshold(0.8);
  assert_eq!(strict.filter(&outputs, &labels(), 10, 10).len(), 1);
}

#[test]
fn coordinates_are_not_clamped() {
  let outputs = SsdOutputs {
    scores: vec![0.9],
    locations: vec![-0.5, -0.25, 1.5, 2.0],
    classes: vec![1.0],
    count: 1.0,
  };
  let rect = DetectionFilter::default().filter(&outputs, &labels(), 40, 20)[0].rect;
  assert_close(rect.left, -10.0);
  assert_close(rect.top, -10.0);
  assert_close(rect.right, 80.0);
  assert_close(rect.bottom, 30.0);
}

#[test]
fn unknown_class_is_dropped() {
  let mut outputs = person_outputs();
  outputs.classes = vec![7.0, 1.0];
  assert!(
    DetectionFilter::default()
      .filter(&outputs, &labels(), 100, 200)
      .is_empty()
  );
}

#[test]
fn stopping_capture_keeps_last_overlay() {
  let (worker, rendered) = FrameWorker::spawn(processor(vec![person_outputs()])).unwrap();
  let mut view = OverlayView::default();

  assert!(worker.send(FrameEvent::Frame(frame())));
  let first = rendered.recv().unwrap();
  view.update(first);

  assert!(worker.send(FrameEvent::SetCapture(false)));
  assert!(worker.send(FrameEvent::Frame(frame())));
  assert!(worker.send(FrameEvent::Frame(frame())));
  worker.join().unwrap();

  assert_eq!(view.poll(&rendered), 0);
  let current = view.current().unwrap();
  assert_eq!(current.index, 1);
  assert_eq!(current.overlays.len(), 1);
}

#[test]
fn worker_processes_frames_in_order() {
  let (worker, rendered) = FrameWorker::spawn(processor(vec![person_outputs()])).unwrap();
  for _ in 0..3 {
    worker.send(FrameEvent::Frame(frame()));
  }
  worker.join().unwrap();
  let indices = rendered.iter().map(|f| f.index).collect::<Vec<_>>();
  assert_eq!(indices, vec![1, 2, 3]);
}

#[test]
fn inference_error_stops_worker() {
  let processor = FrameProcessor::new(FailingModel, labels());
  let (worker, rendered) = FrameWorker::spawn(processor).unwrap();
  worker.send(FrameEvent::Frame(frame()));
  assert!(worker.join().is_err());
  assert!(rendered.recv().is_err());
}

#[test]
fn one_shot_renders_first_frame_only() {
  let collect = Collect::default();
  OneShotTask
    .run_task(
      vec![frame(), frame()].into_iter(),
      processor(vec![person_outputs()]),
      &collect,
    )
    .unwrap();
  assert_eq!(*collect.frames.lock().unwrap(), vec![1]);
}

#[test]
fn continuous_task_honors_frame_limit() {
  let collect = Collect::default();
  ContinuousTask::default()
    .with_frame_number(Some(3))
    .run_task(
      std::iter::repeat_with(frame).take(10),
      processor(vec![person_outputs(), empty_outputs()]),
      &collect,
    )
    .unwrap();
  assert_eq!(*collect.frames.lock().unwrap(), vec![1, 0, 1]);
}

#[test]
fn continuous_task_applies_controls() {
  let (controls, control_rx) = std::sync::mpsc::channel();
  controls.send(FrameEvent::SetCapture(false)).unwrap();
  let collect = Collect::default();
  ContinuousTask::default()
    .with_controls(control_rx)
    .run_task(
      std::iter::repeat_with(frame).take(4),
      processor(vec![person_outputs()]),
      &collect,
    )
    .unwrap();
  assert!(collect.frames.lock().unwrap().is_empty());
}

#[test]
fn continuous_task_ends_when_worker_is_shut_down() {
  let (controls, control_rx) = std::sync::mpsc::channel();
  controls.send(FrameEvent::Shutdown).unwrap();
  controls.send(FrameEvent::SetCapture(true)).unwrap();
  let collect = Collect::default();
  ContinuousTask::default()
    .with_controls(control_rx)
    .run_task(
      std::iter::repeat_with(frame),
      processor(vec![person_outputs()]),
      &collect,
    )
    .unwrap();
  assert!(collect.frames.lock().unwrap().is_empty());
}

#[test]
fn continuous_task_propagates_inference_error() {
  let collect = Collect::default();
  let result = ContinuousTask::default().run_task(
    std::iter::repeat_with(frame).take(2),
    FrameProcessor::new(FailingModel, labels()),
    &collect,
  );
  assert!(result.is_err());
}

fn files_with_extension(root: &Path, extension: &str) -> Vec<PathBuf> {
  let mut found = Vec::new();
  let mut pending = vec![root.to_path_buf()];
  while let Some(dir) = pending.pop() {
    for entry in std::fs::read_dir(dir).unwrap() {
      let path = entry.unwrap().path();
      if path.is_dir() {
        pending.push(path);
      } else if path.extension().is_some_and(|e| e == extension) {
        found.push(path);
      }
    }
  }
  found
}

#[test]
fn continuous_task_records_detected_frames() {
  let dir = tempfile::tempdir().unwrap();
  let output = DirectoryRecordOutput::new(dir.path(), RecordKind::WithLabelName, false);
  ContinuousTask::default()
    .run_task(
      std::iter::repeat_with(frame).take(4),
      processor(vec![person_outputs(), empty_outputs()]),
      output,
    )
    .unwrap();

  assert_eq!(files_with_extension(dir.path(), "png").len(), 2);
  let records = files_with_extension(dir.path(), "txt");
  assert_eq!(records.len(), 2);
  let text = std::fs::read_to_string(&records[0]).unwrap();
  assert!(text.starts_with("person, 0.9000, 20.00, 20.00, 60.00, 100.00"));
}
