// 该文件是 Kanjian （看见） 项目的一部分。
// src/detect/palette.rs - 检测框调色板
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

use image::Rgb;

pub const BLUE: Rgb<u8> = Rgb([0x00, 0x00, 0xFF]);
pub const GREEN: Rgb<u8> = Rgb([0x00, 0xFF, 0x00]);
pub const RED: Rgb<u8> = Rgb([0xFF, 0x00, 0x00]);
pub const CYAN: Rgb<u8> = Rgb([0x00, 0xFF, 0xFF]);
pub const GRAY: Rgb<u8> = Rgb([0x88, 0x88, 0x88]);
pub const BLACK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);
pub const DARK_GRAY: Rgb<u8> = Rgb([0x44, 0x44, 0x44]);
pub const MAGENTA: Rgb<u8> = Rgb([0xFF, 0x00, 0xFF]);
pub const YELLOW: Rgb<u8> = Rgb([0xFF, 0xFF, 0x00]);

/// 固定的 10 色调色板，红色出现两次。
pub const PALETTE: [Rgb<u8>; 10] = [
  BLUE, GREEN, RED, CYAN, GRAY, BLACK, DARK_GRAY, MAGENTA, YELLOW, RED,
];

/// 颜色选择依据
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorBy {
  /// 按候选槽位编号取色，同一类别在不同帧可能颜色不同
  #[default]
  Slot,
  /// 按类别编号取色
  Class,
}

impl std::str::FromStr for ColorBy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "slot" => Ok(ColorBy::Slot),
      "class" => Ok(ColorBy::Class),
      other => Err(format!("未知的取色方式: {}", other)),
    }
  }
}

pub fn color_for(index: usize) -> Rgb<u8> {
  PALETTE[index % PALETTE.len()]
}
