// 该文件是 Kanjian （看见） 项目的一部分。
// src/labels.rs - 类别标签表
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

use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("标签文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签文件为空: {0}")]
  Empty(String),
}

/// 类别编号到名称的映射，启动时加载一次，之后只读。
///
/// 行号即类别编号，空行同样占位。
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
  labels: Box<[String]>,
}

impl LabelMap {
  pub fn load(path: impl AsRef<Path>) -> Result<Self, LabelError> {
    let path = path.as_ref();
    info!("加载标签文件: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let labels = Self::parse(&text);
    if labels.is_empty() {
      return Err(LabelError::Empty(path.display().to_string()));
    }
    debug!("共 {} 个标签", labels.len());
    Ok(labels)
  }

  pub fn parse(text: &str) -> Self {
    let labels = text
      .lines()
      .map(|line| line.trim_end_matches('\r').to_string())
      .collect::<Vec<_>>();
    Self {
      labels: labels.into_boxed_slice(),
    }
  }

  /// 越界时返回 `None`，调用方据此丢弃该检测。
  pub fn get(&self, class_id: usize) -> Option<&str> {
    self.labels.get(class_id).map(String::as_str)
  }

  /// 模型输出的类别是浮点数，截断为整数索引；负数和非有限值视为越界。
  pub fn lookup(&self, class_value: f32) -> Option<(usize, &str)> {
    if !class_value.is_finite() || class_value < 0.0 {
      return None;
    }
    let class_id = class_value as usize;
    self.get(class_id).map(|label| (class_id, label))
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }
}

impl<S: Into<String>> FromIterator<S> for LabelMap {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    let labels = iter.into_iter().map(Into::into).collect::<Vec<_>>();
    Self {
      labels: labels.into_boxed_slice(),
    }
  }
}
