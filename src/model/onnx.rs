// 该文件是 Kanjian （看见） 项目的一部分。
// src/model/onnx.rs - ONNX Runtime 上的 SSD-MobileNet 推理
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

use ndarray::ArrayView4;
use ort::{inputs, session::Session, value::TensorRef};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{AsNhwcFrame, RgbNhwcFrame, SSD_INPUT_SIZE},
  model::{Model, SsdOutputs},
};

// TFLite_Detection_PostProcess 的输出顺序
const DEFAULT_LOCATIONS_OUTPUT: usize = 0;
const DEFAULT_CLASSES_OUTPUT: usize = 1;
const DEFAULT_SCORES_OUTPUT: usize = 2;
const DEFAULT_COUNT_OUTPUT: usize = 3;

#[derive(Error, Debug)]
pub enum OnnxSsdError {
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(String),
  #[error("输入张量形状错误: {0}")]
  ShapeError(#[from] ndarray::ShapeError),
  #[error("模型输出数量为 {actual}, 需要索引 {index}")]
  MissingOutput { index: usize, actual: usize },
  #[error("查询参数 '{0}' 不是合法的输出索引: {1}")]
  BadOutputIndex(String, String),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

fn ort_error(err: impl std::fmt::Display) -> OnnxSsdError {
  OnnxSsdError::OrtError(err.to_string())
}

/// 各检测输出在模型输出列表中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLayout {
  pub locations: usize,
  pub classes: usize,
  pub scores: usize,
  pub count: usize,
}

impl Default for OutputLayout {
  fn default() -> Self {
    Self {
      locations: DEFAULT_LOCATIONS_OUTPUT,
      classes: DEFAULT_CLASSES_OUTPUT,
      scores: DEFAULT_SCORES_OUTPUT,
      count: DEFAULT_COUNT_OUTPUT,
    }
  }
}

impl OutputLayout {
  fn from_query(url: &Url) -> Result<Self, OnnxSsdError> {
    let mut layout = Self::default();
    for (key, value) in url.query_pairs() {
      let slot = match key.as_ref() {
        "locations" => &mut layout.locations,
        "classes" => &mut layout.classes,
        "scores" => &mut layout.scores,
        "count" => &mut layout.count,
        _ => continue,
      };
      *slot = value
        .parse()
        .map_err(|_| OnnxSsdError::BadOutputIndex(key.to_string(), value.to_string()))?;
    }
    Ok(layout)
  }

  fn max_index(&self) -> usize {
    self
      .locations
      .max(self.classes)
      .max(self.scores)
      .max(self.count)
  }
}

/// 输入为 uint8 NHWC `[1, H, W, 3]` 的 SSD 模型。
pub struct OnnxSsd<const W: u32, const H: u32> {
  session: Session,
  layout: OutputLayout,
  output_names: Vec<String>,
}

pub type SsdMobilenet = OnnxSsd<SSD_INPUT_SIZE, SSD_INPUT_SIZE>;

impl<const W: u32, const H: u32> OnnxSsd<W, H> {
  pub fn load(path: &str, layout: OutputLayout) -> Result<Self, OnnxSsdError> {
    info!("加载模型文件: {}", path);
    let session = Session::builder()
      .map_err(ort_error)?
      .commit_from_file(path)
      .map_err(ort_error)?;

    let output_names = session
      .outputs()
      .iter()
      .map(|output| output.name().to_string())
      .collect::<Vec<_>>();
    let num_outputs = output_names.len();
    debug!("模型输入数量: {}", session.inputs().len());
    debug!("模型输出: {:?}", output_names);
    if layout.max_index() >= num_outputs {
      return Err(OnnxSsdError::MissingOutput {
        index: layout.max_index(),
        actual: num_outputs,
      });
    }

    info!("模型加载完成");
    Ok(Self {
      session,
      layout,
      output_names,
    })
  }
}

impl<const W: u32, const H: u32> FromUrlWithScheme for OnnxSsd<W, H> {
  const SCHEME: &'static str = "onnx";
}

impl<const W: u32, const H: u32> FromUrl for OnnxSsd<W, H> {
  type Error = OnnxSsdError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OnnxSsdError::SchemeMismatch(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }
    let layout = OutputLayout::from_query(url)?;
    Self::load(url.path(), layout)
  }
}

impl<const W: u32, const H: u32> Model for OnnxSsd<W, H> {
  type Input = RgbNhwcFrame<W, H>;
  type Output = SsdOutputs;
  type Error = OnnxSsdError;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入");
    let [n, h, w, c] = input.shape();
    let array = ArrayView4::from_shape((n, h, w, c), input.as_nhwc())?;
    let tensor = TensorRef::from_array_view(array).map_err(ort_error)?;

    debug!("执行模型推理");
    let outputs = self.session.run(inputs![tensor]).map_err(ort_error)?;

    let flatten = |index: usize| -> Result<Vec<f32>, OnnxSsdError> {
      let array = outputs[self.output_names[index].as_str()]
        .try_extract_array::<f32>()
        .map_err(ort_error)?;
      Ok(array.iter().copied().collect())
    };

    let result = SsdOutputs {
      locations: flatten(self.layout.locations)?,
      classes: flatten(self.layout.classes)?,
      scores: flatten(self.layout.scores)?,
      count: flatten(self.layout.count)?.first().copied().unwrap_or_default(),
    };
    debug!("模型推理结果：{:?}", result);
    Ok(result)
  }
}
