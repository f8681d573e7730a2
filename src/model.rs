// 该文件是 Kanjian （看见） 项目的一部分。
// src/model.rs - 模型
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// SSD 检测头的原始输出，逐帧生成，画完即丢弃。
///
/// 四个序列按候选槽位对齐：`locations` 每槽四个值
/// `[top, left, bottom, right]`，均为 [0, 1] 归一化坐标。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsdOutputs {
  pub scores: Vec<f32>,
  pub locations: Vec<f32>,
  pub classes: Vec<f32>,
  pub count: f32,
}

impl SsdOutputs {
  pub fn slots(&self) -> usize {
    self.scores.len()
  }

  /// 槽位的 `[top, left, bottom, right]`，数据不全时为 `None`。
  pub fn location(&self, slot: usize) -> Option<[f32; 4]> {
    let base = slot.checked_mul(4)?;
    let end = base.checked_add(4)?;
    match self.locations.get(base..end)? {
      &[top, left, bottom, right] => Some([top, left, bottom, right]),
      _ => None,
    }
  }
}

mod replay;
pub use self::replay::{ReplayModel, ReplayModelError};

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use self::onnx::{OnnxSsd, OnnxSsdError, SsdMobilenet};

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("回放模型错误: {0}")]
  ReplayModelError(#[from] ReplayModelError),
  #[cfg(feature = "onnx")]
  #[error("ONNX 模型错误: {0}")]
  OnnxSsdError(#[from] OnnxSsdError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 按 URL 方案选择推理后端，输入固定为 SSD-MobileNet 的 300x300 帧。
pub enum ModelWrapper {
  Replay(ReplayModel<crate::frame::SsdInputFrame>),
  #[cfg(feature = "onnx")]
  Onnx(SsdMobilenet),
}

impl FromUrl for ModelWrapper {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() == ReplayModel::<crate::frame::SsdInputFrame>::SCHEME {
      return Ok(ModelWrapper::Replay(ReplayModel::from_url(url)?));
    }
    #[cfg(feature = "onnx")]
    if url.scheme() == SsdMobilenet::SCHEME {
      return Ok(ModelWrapper::Onnx(SsdMobilenet::from_url(url)?));
    }
    Err(ModelError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl Model for ModelWrapper {
  type Input = crate::frame::SsdInputFrame;
  type Output = SsdOutputs;
  type Error = ModelError;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    match self {
      ModelWrapper::Replay(model) => model.infer(input).map_err(ModelError::from),
      #[cfg(feature = "onnx")]
      ModelWrapper::Onnx(model) => model.infer(input).map_err(ModelError::from),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn location_requires_all_four_values() {
    let outputs = SsdOutputs {
      scores: vec![0.9, 0.8],
      locations: vec![0.1, 0.2, 0.5, 0.6, 0.3, 0.3],
      classes: vec![0.0, 1.0],
      count: 2.0,
    };
    assert_eq!(outputs.location(0), Some([0.1, 0.2, 0.5, 0.6]));
    assert_eq!(outputs.location(1), None);
    assert_eq!(outputs.location(usize::MAX), None);
  }

  #[test]
  fn count_defaults_when_absent() {
    let outputs: SsdOutputs =
      serde_json::from_str(r#"{"scores":[0.7],"locations":[0,0,1,1],"classes":[3]}"#).unwrap();
    assert_eq!(outputs.count, 0.0);
    assert_eq!(outputs.slots(), 1);
  }

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("tflite:///model.tflite").unwrap();
    assert!(matches!(
      ModelWrapper::from_url(&url),
      Err(ModelError::SchemeMismatch(_))
    ));
  }
}
