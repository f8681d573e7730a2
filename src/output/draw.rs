// 该文件是 Kanjian （看见） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::{debug, info};

use crate::detect::{Overlay, PixelRect};

// 线宽与字号都按画布高度的比例计算
const STROKE_HEIGHT_DIVISOR: f32 = 85.0;
const TEXT_HEIGHT_DIVISOR: f32 = 15.0;

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("字体文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(String),
}

/// 检测框绘制器
///
/// 没有字体时只画框，不画文字。
#[derive(Clone, Default)]
pub struct Draw {
  font: Option<FontArc>,
}

impl Draw {
  pub fn with_font_file(path: impl AsRef<Path>) -> Result<Self, DrawError> {
    let path = path.as_ref();
    info!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    let font = FontArc::try_from_vec(data)
      .map_err(|e| DrawError::InvalidFont(format!("{}: {}", path.display(), e)))?;
    Ok(Self { font: Some(font) })
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  pub fn stroke_width(height: u32) -> i32 {
    ((height as f32 / STROKE_HEIGHT_DIVISOR).round() as i32).max(1)
  }

  pub fn text_size(height: u32) -> f32 {
    height as f32 / TEXT_HEIGHT_DIVISOR
  }

  /// 文字基线落在框的左上角，`draw_text_mut` 需要的是字形框左上角，故上移一个字号。
  pub fn text_origin(rect: &PixelRect, text_size: f32) -> (i32, i32) {
    (
      rect.left.round() as i32,
      (rect.top - text_size).round() as i32,
    )
  }

  /// 按检测顺序绘制，后画的覆盖先画的。
  pub fn draw_overlays(&self, image: &mut RgbImage, overlays: &[Overlay]) {
    let stroke = Self::stroke_width(image.height());
    let text_size = Self::text_size(image.height());

    for overlay in overlays {
      draw_outline(image, &overlay.rect, stroke, overlay.color);

      if let Some(font) = &self.font {
        let (x, y) = Self::text_origin(&overlay.rect, text_size);
        draw_text_mut(
          image,
          overlay.color,
          x,
          y,
          PxScale::from(text_size),
          font,
          &overlay.text(),
        );
      }
    }
    debug!("绘制 {} 个检测框", overlays.len());
  }
}

/// 以矩形边为中心绘制 `stroke` 像素宽的边框，画布外的部分自然被裁掉。
fn draw_outline(image: &mut RgbImage, rect: &PixelRect, stroke: i32, color: Rgb<u8>) {
  let (width, height) = (image.width() as i64, image.height() as i64);
  let margin = stroke as i64 + 1;
  // 超出画布很远的坐标收拢到画布附近，可见像素不变
  let clamp_x = |v: f32| (v.round() as i64).clamp(-margin, width + margin);
  let clamp_y = |v: f32| (v.round() as i64).clamp(-margin, height + margin);

  let rect = rect.sorted();
  let (left, top) = (clamp_x(rect.left), clamp_y(rect.top));
  let (right, bottom) = (clamp_x(rect.right), clamp_y(rect.bottom));

  let half = stroke as i64 / 2;
  for offset in -half..(stroke as i64 - half) {
    let (x0, y0) = (left - offset, top - offset);
    let (x1, y1) = (right + offset, bottom + offset);
    if x1 < x0 || y1 < y0 {
      continue;
    }
    let r = Rect::at(x0 as i32, y0 as i32).of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
    draw_hollow_rect_mut(image, r, color);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::detect::palette;

  fn overlay(rect: PixelRect, color: Rgb<u8>) -> Overlay {
    Overlay {
      slot: 0,
      class_id: 1,
      label: "person".into(),
      score: 0.9,
      rect,
      color,
    }
  }

  #[test]
  fn stroke_and_text_scale_with_height() {
    assert_eq!(Draw::stroke_width(85), 1);
    assert_eq!(Draw::stroke_width(10), 1);
    assert_eq!(Draw::stroke_width(850), 10);
    assert_eq!(Draw::text_size(150), 10.0);
  }

  #[test]
  fn outline_is_drawn_on_rect_edges() {
    let mut image = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
    let rect = PixelRect {
      left: 5.0,
      top: 10.0,
      right: 30.0,
      bottom: 20.0,
    };
    Draw::default().draw_overlays(&mut image, &[overlay(rect, palette::RED)]);

    assert_eq!(*image.get_pixel(5, 15), palette::RED);
    assert_eq!(*image.get_pixel(30, 15), palette::RED);
    assert_eq!(*image.get_pixel(15, 10), palette::RED);
    assert_eq!(*image.get_pixel(15, 20), palette::RED);
    // 内部不填充
    assert_eq!(*image.get_pixel(15, 15), Rgb([255, 255, 255]));
  }

  #[test]
  fn box_past_canvas_is_clipped_not_moved() {
    let mut image = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
    let rect = PixelRect {
      left: 10.0,
      top: 5.0,
      right: 1.0e9,
      bottom: 15.0,
    };
    Draw::default().draw_overlays(&mut image, &[overlay(rect, palette::BLUE)]);

    assert_eq!(*image.get_pixel(10, 10), palette::BLUE);
    assert_eq!(*image.get_pixel(19, 5), palette::BLUE);
    // 右边在画布外，最后一列只有上下边的像素
    assert_eq!(*image.get_pixel(19, 10), Rgb([255, 255, 255]));
  }

  #[test]
  fn inverted_rect_is_drawn_sorted() {
    let mut image = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
    let rect = PixelRect {
      left: 15.0,
      top: 15.0,
      right: 5.0,
      bottom: 5.0,
    };
    Draw::default().draw_overlays(&mut image, &[overlay(rect, palette::GREEN)]);
    assert_eq!(*image.get_pixel(5, 10), palette::GREEN);
    assert_eq!(*image.get_pixel(15, 10), palette::GREEN);
  }

  #[test]
  fn text_sits_on_top_left_corner() {
    let rect = PixelRect {
      left: 20.0,
      top: 20.0,
      right: 60.0,
      bottom: 100.0,
    };
    let text_size = Draw::text_size(150);
    assert_eq!(Draw::text_origin(&rect, text_size), (20, 10));

    // 框贴着画布顶边时文字起点在画布外，由绘制时裁掉
    let rect = PixelRect { top: 3.0, ..rect };
    assert_eq!(Draw::text_origin(&rect, text_size), (20, -7));
  }

  #[test]
  fn missing_font_file_is_an_error() {
    assert!(matches!(
      Draw::with_font_file("/nonexistent/font.ttf"),
      Err(DrawError::IoError(_))
    ));
  }
}
