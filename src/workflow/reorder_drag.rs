//! 拖拽排序会话
//!
//! 指针移动距离未达到阈值前不算拖拽，这样行内按钮（如"编辑"）的点击不会被拦截。
//!
//! ```text
//! Idle -> Pending -> Active -> Idle
//!            \-----> Idle (未达阈值即松开 = 点击)
//! ```

use tracing::debug;

/// 指针位置（像素）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPos {
    pub x: f64,
    pub y: f64,
}

impl PointerPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance_to(self, other: PointerPos) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragPhase {
    Idle,
    Pending { from: usize, origin: PointerPos },
    Active { from: usize, over: usize },
}

/// 一次拖拽会话的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// 未激活就松开，交给行内按钮处理
    Click { index: usize },
    /// 请求把 `from` 移到 `to`
    Reorder { from: usize, to: usize },
    /// 拖回原位或取消
    Cancelled,
    /// 没有进行中的会话
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ReorderDrag {
    activation_distance: f64,
    phase: DragPhase,
}

impl ReorderDrag {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance: activation_distance.max(0.0),
            phase: DragPhase::Idle,
        }
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, DragPhase::Active { .. })
    }

    pub fn pointer_down(&mut self, index: usize, pos: PointerPos) {
        if self.phase == DragPhase::Idle {
            self.phase = DragPhase::Pending { from: index, origin: pos };
        }
    }

    /// `over` 为当前指针下方的行
    pub fn pointer_move(&mut self, pos: PointerPos, over: usize) {
        match self.phase {
            DragPhase::Pending { from, origin } => {
                if origin.distance_to(pos) >= self.activation_distance {
                    debug!("拖拽激活: 第 {} 行", from + 1);
                    self.phase = DragPhase::Active { from, over };
                }
            }
            DragPhase::Active { from, .. } => {
                self.phase = DragPhase::Active { from, over };
            }
            DragPhase::Idle => {}
        }
    }

    pub fn pointer_up(&mut self) -> DragOutcome {
        let outcome = match self.phase {
            DragPhase::Idle => DragOutcome::Ignored,
            DragPhase::Pending { from, .. } => DragOutcome::Click { index: from },
            DragPhase::Active { from, over } if from == over => DragOutcome::Cancelled,
            DragPhase::Active { from, over } => DragOutcome::Reorder { from, to: over },
        };
        self.phase = DragPhase::Idle;
        outcome
    }

    pub fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_travel_is_a_click() {
        let mut drag = ReorderDrag::new(8.0);
        drag.pointer_down(2, PointerPos::new(10.0, 10.0));
        drag.pointer_move(PointerPos::new(13.0, 14.0), 3);
        assert!(!drag.is_active());
        assert_eq!(drag.pointer_up(), DragOutcome::Click { index: 2 });
    }

    #[test]
    fn test_travel_past_threshold_reorders() {
        let mut drag = ReorderDrag::new(8.0);
        drag.pointer_down(3, PointerPos::new(0.0, 100.0));
        drag.pointer_move(PointerPos::new(0.0, 60.0), 2);
        drag.pointer_move(PointerPos::new(0.0, 0.0), 0);
        assert_eq!(drag.pointer_up(), DragOutcome::Reorder { from: 3, to: 0 });
        assert_eq!(drag.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_drop_on_origin_cancels() {
        let mut drag = ReorderDrag::new(4.0);
        drag.pointer_down(1, PointerPos::new(0.0, 0.0));
        drag.pointer_move(PointerPos::new(0.0, 20.0), 1);
        assert_eq!(drag.pointer_up(), DragOutcome::Cancelled);
        assert_eq!(drag.pointer_up(), DragOutcome::Ignored);
    }
}
