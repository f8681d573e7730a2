// 该文件是 Kanjian （看见） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};

use chrono::{DateTime, Datelike, Local};
use image::RgbImage;
use thiserror::Error;
use tracing::debug;

use crate::{FromUrl, FromUrlWithScheme, detect::Overlay, output::Render};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 除图像外是否再写一份文本记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
  ImageOnly,
  WithLabelName,
  WithClassId,
}

impl RecordKind {
  fn record_lines(&self, overlays: &[Overlay]) -> Option<String> {
    let with_name = match self {
      RecordKind::ImageOnly => return None,
      RecordKind::WithLabelName => true,
      RecordKind::WithClassId => false,
    };
    let lines = overlays
      .iter()
      .map(|overlay| {
        let name = if with_name {
          overlay.label.clone()
        } else {
          overlay.class_id.to_string()
        };
        format!(
          "{}, {:.4}, {:.2}, {:.2}, {:.2}, {:.2}",
          name,
          overlay.score,
          overlay.rect.left,
          overlay.rect.top,
          overlay.rect.right,
          overlay.rect.bottom
        )
      })
      .collect::<Vec<_>>();
    Some(lines.join("\n"))
  }
}

/// 按日期分目录保存画好的帧：`<dir>/YYYY/MM/DD/HH-MM-SS-NNNN.png`。
///
/// 默认只保存有检测结果的帧，带 `always` 参数时每帧都保存。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  kind: RecordKind,
  frame_counter: AtomicU16,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let kind = uri
      .query_pairs()
      .find(|(k, _)| k == "record")
      .map(|(_, v)| {
        if v == "id" {
          RecordKind::WithClassId
        } else {
          RecordKind::WithLabelName
        }
      })
      .unwrap_or(RecordKind::ImageOnly);

    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput::new(uri.path(), kind, always))
  }
}

impl DirectoryRecordOutput {
  pub fn new(directory: impl Into<PathBuf>, kind: RecordKind, always: bool) -> Self {
    Self {
      directory: directory.into(),
      kind,
      frame_counter: AtomicU16::new(0),
      always,
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn frame_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  fn frame_path(&self, now: DateTime<Local>) -> Result<PathBuf, DirectoryRecordOutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    // 计数器每次启动从 1 开始，同一秒内重启时跳过上次留下的文件
    let second = now.format("%H-%M-%S").to_string();
    for _ in 0..=u16::MAX {
      let path = directory.join(format!("{}-{:04X}.png", second, self.frame_id()));
      if !path.exists() {
        return Ok(path);
      }
      debug!("帧文件已存在，跳过: {}", path.display());
    }
    Err(DirectoryRecordOutputError::IoError(std::io::Error::new(
      std::io::ErrorKind::AlreadyExists,
      format!("{} 秒内的帧编号已用尽: {}", second, directory.display()),
    )))
  }
}

impl Render<RgbImage, [Overlay]> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &RgbImage, result: &[Overlay]) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      return Ok(());
    }

    let path = self.frame_path(Local::now())?;
    frame.save(&path)?;
    if let Some(records) = self.kind.record_lines(result) {
      std::fs::write(path.with_extension("txt"), records)?;
    }
    debug!("记录帧到: {}", path.display());
    Ok(())
  }
}
