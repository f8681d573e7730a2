// 该文件是 Kanjian （看见） 项目的一部分。
// src/detect.rs - 逐帧检测结果筛选与坐标映射
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

//! SSD 输出的逐帧筛选。
//!
//! 分数严格大于阈值的候选全部保留：不做 NMS、不排序、不去重，
//! 重叠的框各自绘制。归一化坐标按画布宽高分别线性缩放，不做裁剪。

use image::Rgb;
use tracing::{debug, warn};

use crate::{labels::LabelMap, model::SsdOutputs};

pub mod palette;
pub use self::palette::{ColorBy, PALETTE};

pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

/// 像素坐标系下的矩形，可能超出画布，也可能左右颠倒。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
}

impl PixelRect {
  /// `location` 为 `[top, left, bottom, right]` 归一化坐标。
  pub fn from_normalized(location: [f32; 4], width: f32, height: f32) -> Self {
    let [top, left, bottom, right] = location;
    Self {
      left: left * width,
      top: top * height,
      right: right * width,
      bottom: bottom * height,
    }
  }

  /// 边按大小排序后的矩形
  pub fn sorted(&self) -> Self {
    Self {
      left: self.left.min(self.right),
      top: self.top.min(self.bottom),
      right: self.left.max(self.right),
      bottom: self.top.max(self.bottom),
    }
  }

  pub fn contains(&self, x: f32, y: f32) -> bool {
    let rect = self.sorted();
    rect.left < rect.right
      && rect.top < rect.bottom
      && x >= rect.left
      && x < rect.right
      && y >= rect.top
      && y < rect.bottom
  }
}

/// 一个被保留的检测及其绘制参数
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
  pub slot: usize,
  pub class_id: usize,
  pub label: String,
  pub score: f32,
  pub rect: PixelRect,
  pub color: Rgb<u8>,
}

impl Overlay {
  /// `"<label> <score>"`
  pub fn text(&self) -> String {
    format!("{} {:?}", self.label, self.score)
  }
}

#[derive(Debug, Clone, Copy)]
pub struct DetectionFilter {
  pub threshold: f32,
  pub color_by: ColorBy,
}

impl Default for DetectionFilter {
  fn default() -> Self {
    Self {
      threshold: DEFAULT_SCORE_THRESHOLD,
      color_by: ColorBy::default(),
    }
  }
}

impl DetectionFilter {
  pub fn with_threshold(mut self, threshold: f32) -> Self {
    self.threshold = threshold;
    self
  }

  pub fn with_color_by(mut self, color_by: ColorBy) -> Self {
    self.color_by = color_by;
    self
  }

  /// 把一帧的原始输出变成绘制计划，画布尺寸为 `width` x `height` 像素。
  ///
  /// 位置或类别数据缺失的槽位跳过；类别越界时丢弃该检测。
  pub fn filter(
    &self,
    outputs: &SsdOutputs,
    labels: &LabelMap,
    width: u32,
    height: u32,
  ) -> Vec<Overlay> {
    let (w, h) = (width as f32, height as f32);
    let mut overlays = Vec::new();

    for (slot, &score) in outputs.scores.iter().enumerate() {
      if score.is_nan() || score <= self.threshold {
        continue;
      }

      let Some(location) = outputs.location(slot) else {
        debug!("槽位 {} 缺少位置数据，跳过", slot);
        continue;
      };
      if !location.iter().all(|v| v.is_finite()) {
        debug!("槽位 {} 的位置 {:?} 不是有限值，跳过", slot, location);
        continue;
      }
      let Some(&class_value) = outputs.classes.get(slot) else {
        debug!("槽位 {} 缺少类别数据，跳过", slot);
        continue;
      };
      let Some((class_id, label)) = labels.lookup(class_value) else {
        warn!(
          "槽位 {} 的类别 {} 超出标签范围 (共 {} 个)，丢弃",
          slot,
          class_value,
          labels.len()
        );
        continue;
      };

      let color = match self.color_by {
        ColorBy::Slot => palette::color_for(slot),
        ColorBy::Class => palette::color_for(class_id),
      };

      overlays.push(Overlay {
        slot,
        class_id,
        label: label.to_string(),
        score,
        rect: PixelRect::from_normalized(location, w, h),
        color,
      });
    }

    debug!("保留 {} / {} 个候选", overlays.len(), outputs.slots());
    overlays
  }
}

/// 返回第一个包含该点的检测。
pub fn hit_test(overlays: &[Overlay], x: f32, y: f32) -> Option<&Overlay> {
  overlays.iter().find(|overlay| overlay.rect.contains(x, y))
}
