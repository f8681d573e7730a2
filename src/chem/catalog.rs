// 该文件是 Kanjian （看见） 项目的一部分。
// src/chem/catalog.rs - 分子目录
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

use std::path::PathBuf;

use serde::Serialize;

/// 模型缩放到的目标尺寸（单位长度）
pub const MODEL_SCALE_TO_UNITS: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Molecule {
  pub name: &'static str,
  pub formula: &'static str,
  /// g/mol
  pub molecular_weight: f32,
  #[serde(rename = "type")]
  pub kind: &'static str,
  pub uses: &'static [&'static str],
}

impl Molecule {
  pub fn asset_path(&self) -> PathBuf {
    PathBuf::from("models").join(format!("{}.glb", self.name))
  }

  pub fn has_use(&self, answer: &str) -> bool {
    self.uses.contains(&answer)
  }
}

pub const CATALOG: [Molecule; 5] = [
  Molecule {
    name: "glicose",
    formula: "C12H22O11",
    molecular_weight: 342.3,
    kind: "Disaccharide",
    uses: &["Sweetening agent"],
  },
  Molecule {
    name: "acido-sulfurico",
    formula: "H2SO4",
    molecular_weight: 98.08,
    kind: "Acid",
    uses: &["Corrosive"],
  },
  Molecule {
    name: "agua",
    formula: "H2O",
    molecular_weight: 18.01,
    kind: "Oxide",
    uses: &["Solvent"],
  },
  Molecule {
    name: "benzeno",
    formula: "C6H6",
    molecular_weight: 78.11,
    kind: "Hydrocarbon",
    uses: &["Flammable", "Irritant", "Health Hazar", "Fuel"],
  },
  Molecule {
    name: "dioxido-carbono",
    formula: "CO2",
    molecular_weight: 44.00,
    kind: "Oxide",
    uses: &["Compressed Gas"],
  },
];

/// 目录上的当前位置，左右切换时首尾相接。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Carousel {
  index: usize,
}

impl Carousel {
  /// 超出目录长度的位置按目录长度取模
  pub fn at(index: usize) -> Self {
    Self {
      index: index % CATALOG.len(),
    }
  }

  /// 按名称定位，找不到返回 `None`
  pub fn find(name: &str) -> Option<Self> {
    CATALOG
      .iter()
      .position(|m| m.name == name)
      .map(|index| Self { index })
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn current(&self) -> &'static Molecule {
    &CATALOG[self.index]
  }

  /// 移动 `offset` 个位置，任意正负步数都回绕到目录范围内。
  pub fn step(&mut self, offset: isize) -> &'static Molecule {
    let len = CATALOG.len() as isize;
    self.index = (self.index as isize + offset).rem_euclid(len) as usize;
    self.current()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn starts_at_first_molecule() {
    assert_eq!(Carousel::default().current().name, "glicose");
  }

  #[test]
  fn step_wraps_both_ways() {
    let mut carousel = Carousel::default();
    assert_eq!(carousel.step(-1).name, "dioxido-carbono");
    assert_eq!(carousel.step(1).name, "glicose");
    assert_eq!(carousel.step(2).name, "agua");
    assert_eq!(carousel.step(3).name, "glicose");
    assert_eq!(carousel.step(-11).name, "dioxido-carbono");
    assert_eq!(carousel.index(), 4);
  }

  #[test]
  fn find_by_name() {
    assert_eq!(Carousel::find("benzeno").map(|c| c.index()), Some(3));
    assert!(Carousel::find("sucrose").is_none());
    assert_eq!(Carousel::at(7).index(), 2);
  }

  #[test]
  fn asset_path_uses_name() {
    assert_eq!(
      CATALOG[2].asset_path(),
      PathBuf::from("models").join("agua.glb")
    );
  }

  #[test]
  fn serializes_kind_as_type() {
    let json = serde_json::to_value(CATALOG[0]).unwrap();
    assert_eq!(json["type"], "Disaccharide");
    assert_eq!(json["uses"][0], "Sweetening agent");
  }
}
