// 该文件是 Kanjian （看见） 项目的一部分。
// src/chem/quiz.rs - 分子用途问答
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

use tracing::debug;

use super::Molecule;

pub const QUESTION: &str = "Which of the following is a valid use of the molecule?";

pub const ANSWERS: [&str; 5] = [
  "Sweetening agent",
  "Solvent",
  "Fuel",
  "Antiseptic",
  "Detergent",
];

/// 一次作答。选项固定，只记录选中的下标。
#[derive(Debug, Clone, Default)]
pub struct Quiz {
  selected: Option<usize>,
}

impl Quiz {
  /// 下标越界时保持未选中
  pub fn select(&mut self, index: usize) -> Option<&'static str> {
    self.selected = (index < ANSWERS.len()).then_some(index);
    self.selected_answer()
  }

  /// 按答案文本选择，大小写不敏感
  pub fn select_answer(&mut self, answer: &str) -> Option<&'static str> {
    self.selected = ANSWERS.iter().position(|a| a.eq_ignore_ascii_case(answer));
    self.selected_answer()
  }

  pub fn clear(&mut self) {
    self.selected = None;
  }

  pub fn selected_answer(&self) -> Option<&'static str> {
    self.selected.map(|i| ANSWERS[i])
  }

  /// 未选择时没有结论；否则选中的答案在分子用途里即为正确。
  pub fn submit(&self, molecule: &Molecule) -> Option<bool> {
    let answer = self.selected_answer()?;
    let correct = molecule.has_use(answer);
    debug!("{}: {} -> {}", molecule.name, answer, correct);
    Some(correct)
  }
}
