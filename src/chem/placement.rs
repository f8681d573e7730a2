// 该文件是 Kanjian （看见） 项目的一部分。
// src/chem/placement.rs - 模型放置按钮状态
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

/// 放置按钮的可见性只取决于最近一次事件。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
  button_visible: bool,
  anchored: bool,
}

impl Placement {
  /// 平面命中检测结果：正在跟踪时才显示按钮
  pub fn on_hit_result(&mut self, tracking: bool) {
    self.button_visible = tracking;
  }

  /// 锚点变化：已锚定后隐藏按钮
  pub fn on_anchor_changed(&mut self, anchored: bool) {
    self.anchored = anchored;
    self.button_visible = !anchored;
  }

  /// 按下放置按钮。按钮不可见时无效，返回是否完成锚定。
  pub fn place(&mut self) -> bool {
    if !self.button_visible {
      return false;
    }
    debug!("模型已锚定");
    self.on_anchor_changed(true);
    true
  }

  pub fn button_visible(&self) -> bool {
    self.button_visible
  }

  pub fn is_anchored(&self) -> bool {
    self.anchored
  }
}
