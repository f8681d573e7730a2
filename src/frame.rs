// 该文件是 Kanjian （看见） 项目的一部分。
// src/frame.rs - NHWC 模型输入帧定义
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

use image::{RgbImage, imageops::FilterType};

const RGB_CHANNELS: usize = 3;

/// SSD-MobileNet v1 的输入尺寸
pub const SSD_INPUT_SIZE: u32 = 300;

pub trait AsNhwcFrame<const W: u32, const H: u32> {
  fn as_nhwc(&self) -> &[u8];
}

/// 固定尺寸的 RGB NHWC（批大小为 1）u8 帧，作为模型输入。
#[derive(Debug, Clone)]
pub struct RgbNhwcFrame<const W: u32, const H: u32> {
  data: Box<[u8]>,
}

pub type SsdInputFrame = RgbNhwcFrame<SSD_INPUT_SIZE, SSD_INPUT_SIZE>;

impl<const W: u32, const H: u32> RgbNhwcFrame<W, H> {
  pub const LEN: usize = RGB_CHANNELS * W as usize * H as usize;

  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn shape(&self) -> [usize; 4] {
    [1, H as usize, W as usize, RGB_CHANNELS]
  }
}

impl<const W: u32, const H: u32> TryFrom<Vec<u8>> for RgbNhwcFrame<W, H> {
  type Error = Vec<u8>;

  /// 长度不符时原样退回数据。
  fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
    if data.len() != Self::LEN {
      return Err(data);
    }
    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

impl<const W: u32, const H: u32> Default for RgbNhwcFrame<W, H> {
  fn default() -> Self {
    Self {
      data: vec![0u8; Self::LEN].into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> From<&RgbImage> for RgbNhwcFrame<W, H> {
  /// 采集帧可以是任意尺寸，双线性缩放到模型输入尺寸。
  fn from(image: &RgbImage) -> Self {
    let data = if image.dimensions() == (W, H) {
      image.as_raw().clone()
    } else {
      image::imageops::resize(image, W, H, FilterType::Triangle).into_raw()
    };
    Self {
      data: data.into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> AsMut<[u8]> for RgbNhwcFrame<W, H> {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> AsNhwcFrame<W, H> for RgbNhwcFrame<W, H> {
  fn as_nhwc(&self) -> &[u8] {
    &self.data
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn resizes_captured_frame_to_model_shape() {
    let image = RgbImage::from_pixel(64, 48, Rgb([10, 20, 30]));
    let frame = RgbNhwcFrame::<8, 4>::from(&image);
    assert_eq!(frame.as_nhwc().len(), 8 * 4 * 3);
    assert_eq!(frame.shape(), [1, 4, 8, 3]);
    assert_eq!(&frame.as_nhwc()[..3], &[10, 20, 30]);
  }

  #[test]
  fn same_size_frame_is_copied_verbatim() {
    let image = RgbImage::from_fn(2, 2, |x, y| Rgb([x as u8, y as u8, 7]));
    let frame = RgbNhwcFrame::<2, 2>::from(&image);
    assert_eq!(frame.as_nhwc(), image.as_raw().as_slice());
  }

  #[test]
  fn rejects_wrong_length_buffer() {
    assert!(RgbNhwcFrame::<2, 2>::try_from(vec![0u8; 11]).is_err());
    assert!(RgbNhwcFrame::<2, 2>::try_from(vec![0u8; 12]).is_ok());
  }
}
