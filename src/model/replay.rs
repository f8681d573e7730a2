// 该文件是 Kanjian （看见） 项目的一部分。
// src/model/replay.rs - 回放录制的模型输出
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

use std::marker::PhantomData;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{Model, SsdOutputs},
};

#[derive(Error, Debug)]
pub enum ReplayModelError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("第 {line} 行解析失败: {source}")]
  ParseError {
    line: usize,
    source: serde_json::Error,
  },
  #[error("录制文件没有任何输出: {0}")]
  Empty(String),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 按顺序回放 JSON Lines 文件中录制的 SSD 输出，循环使用。
///
/// 每行一个 [`SsdOutputs`] 对象，空行忽略。输入帧只用于对齐接口，不参与计算。
pub struct ReplayModel<Frame> {
  records: Box<[SsdOutputs]>,
  cursor: usize,
  _phantom: PhantomData<Frame>,
}

impl<Frame> ReplayModel<Frame> {
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayModelError> {
    let path = path.as_ref();
    info!("加载回放文件: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let model = Self::parse(&text).map_err(|err| match err {
      ReplayModelError::Empty(_) => ReplayModelError::Empty(path.display().to_string()),
      other => other,
    })?;
    debug!("回放记录数量: {}", model.records.len());
    Ok(model)
  }

  pub fn parse(text: &str) -> Result<Self, ReplayModelError> {
    let records = text
      .lines()
      .enumerate()
      .filter(|(_, line)| !line.trim().is_empty())
      .map(|(index, line)| {
        serde_json::from_str::<SsdOutputs>(line).map_err(|source| ReplayModelError::ParseError {
          line: index + 1,
          source,
        })
      })
      .collect::<Result<Vec<_>, _>>()?;
    Self::from_records(records)
  }

  pub fn from_records(records: Vec<SsdOutputs>) -> Result<Self, ReplayModelError> {
    if records.is_empty() {
      return Err(ReplayModelError::Empty(String::from("<memory>")));
    }
    Ok(Self {
      records: records.into_boxed_slice(),
      cursor: 0,
      _phantom: PhantomData,
    })
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

impl<Frame> FromUrlWithScheme for ReplayModel<Frame> {
  const SCHEME: &'static str = "replay";
}

impl<Frame> FromUrl for ReplayModel<Frame> {
  type Error = ReplayModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayModelError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }
    Self::load(url.path())
  }
}

impl<Frame> Model for ReplayModel<Frame> {
  type Input = Frame;
  type Output = SsdOutputs;
  type Error = ReplayModelError;

  fn infer(&mut self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("回放第 {} 条记录", self.cursor);
    let output = self.records[self.cursor].clone();
    self.cursor = (self.cursor + 1) % self.records.len();
    Ok(output)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const RECORDS: &str = r#"
{"scores":[0.9,0.3],"locations":[0.1,0.2,0.5,0.6,0,0,0,0],"classes":[1,2],"count":2}

{"scores":[0.6],"locations":[0,0,1,1],"classes":[0],"count":1}
"#;

  #[test]
  fn replays_records_in_order_and_cycles() {
    let mut model = ReplayModel::<()>::parse(RECORDS).unwrap();
    assert_eq!(model.len(), 2);
    assert_eq!(model.infer(&()).unwrap().scores, vec![0.9, 0.3]);
    assert_eq!(model.infer(&()).unwrap().scores, vec![0.6]);
    assert_eq!(model.infer(&()).unwrap().scores, vec![0.9, 0.3]);
  }

  #[test]
  fn reports_line_of_bad_record() {
    let err = ReplayModel::<()>::parse("{\"scores\":[]}\nnot json\n")
      .err()
      .unwrap();
    assert!(matches!(err, ReplayModelError::ParseError { line: 2, .. }));
  }

  #[test]
  fn empty_recording_is_rejected() {
    assert!(matches!(
      ReplayModel::<()>::parse("\n\n"),
      Err(ReplayModelError::Empty(_))
    ));
  }

  #[test]
  fn loads_from_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outputs.jsonl");
    std::fs::write(&path, RECORDS).unwrap();
    let url = Url::from_file_path(&path).unwrap();
    let mut url = url.to_string();
    url.replace_range(..4, "replay");
    let model = ReplayModel::<()>::from_url(&Url::parse(&url).unwrap()).unwrap();
    assert_eq!(model.len(), 2);
  }
}
