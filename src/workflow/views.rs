//! 终稿的两个列表视图
//!
//! 控制列表（紧凑的行）和预览列表（排版后的题目块）各自持有一个
//! `watch::Receiver`，都只读同一个 `PaperOrder`。两边的拖拽只产出
//! `DragOutcome`，真正的移动统一交给 [`apply_outcome`]。

use tokio::sync::watch;

use crate::models::question::QuestionId;
use crate::models::theme::PaperLayout;
use crate::render::html::question_block;
use crate::utils::truncate_text;
use crate::workflow::paper_order::{OrderSnapshot, PaperOrder};
use crate::workflow::reorder_drag::{DragOutcome, PointerPos, ReorderDrag};
use crate::workflow::selection::SelectionPipeline;

/// 订阅终稿顺序的视图
pub trait OrderView {
    fn receiver(&self) -> &watch::Receiver<OrderSnapshot>;
    fn drag_mut(&mut self) -> &mut ReorderDrag;

    /// 当前顺序的快照
    fn snapshot(&self) -> OrderSnapshot {
        self.receiver().borrow().clone()
    }

    fn ids(&self) -> Vec<QuestionId> {
        self.snapshot().iter().map(|p| p.question.id.clone()).collect()
    }

    fn pointer_down(&mut self, row: usize, pos: PointerPos) {
        self.drag_mut().pointer_down(row, pos);
    }

    fn pointer_move(&mut self, pos: PointerPos, over_row: usize) {
        self.drag_mut().pointer_move(pos, over_row);
    }

    fn pointer_up(&mut self) -> DragOutcome {
        self.drag_mut().pointer_up()
    }
}

/// 能接受排序请求的数据源
pub trait Reorderable {
    fn reorder(&mut self, from: usize, to: usize) -> bool;
}

impl Reorderable for PaperOrder {
    fn reorder(&mut self, from: usize, to: usize) -> bool {
        self.move_item(from, to)
    }
}

impl Reorderable for SelectionPipeline {
    fn reorder(&mut self, from: usize, to: usize) -> bool {
        self.reorder_final(from, to)
    }
}

/// 把视图产出的拖拽结果落到唯一的数据源上
pub fn apply_outcome(target: &mut impl Reorderable, outcome: DragOutcome) -> bool {
    match outcome {
        DragOutcome::Reorder { from, to } => target.reorder(from, to),
        DragOutcome::Click { .. } | DragOutcome::Cancelled | DragOutcome::Ignored => false,
    }
}

/// 控制列表：每题一行，`1. [选择题] 2分 · 函数`
pub struct ControlListView {
    rx: watch::Receiver<OrderSnapshot>,
    drag: ReorderDrag,
}

impl ControlListView {
    pub fn new(rx: watch::Receiver<OrderSnapshot>, activation_px: f64) -> Self {
        Self {
            rx,
            drag: ReorderDrag::new(activation_px),
        }
    }

    pub fn rows(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|p| {
                let q = &p.question;
                let mut row = format!("{}. [{}] {}分", p.number, q.question_type.name(), q.marks);
                if !q.topic.is_empty() {
                    row.push_str(" · ");
                    row.push_str(&truncate_text(&q.topic, 20));
                }
                row
            })
            .collect()
    }
}

impl OrderView for ControlListView {
    fn receiver(&self) -> &watch::Receiver<OrderSnapshot> {
        &self.rx
    }

    fn drag_mut(&mut self) -> &mut ReorderDrag {
        &mut self.drag
    }
}

/// 预览列表：按当前版式渲染的题目块
pub struct PreviewListView {
    rx: watch::Receiver<OrderSnapshot>,
    drag: ReorderDrag,
    layout: PaperLayout,
}

impl PreviewListView {
    pub fn new(rx: watch::Receiver<OrderSnapshot>, layout: PaperLayout, activation_px: f64) -> Self {
        Self {
            rx,
            drag: ReorderDrag::new(activation_px),
            layout,
        }
    }

    pub fn set_layout(&mut self, layout: PaperLayout) {
        self.layout = layout;
    }

    pub fn blocks(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|p| question_block(p, &self.layout))
            .collect()
    }
}

impl OrderView for PreviewListView {
    fn receiver(&self) -> &watch::Receiver<OrderSnapshot> {
        &self.rx
    }

    fn drag_mut(&mut self) -> &mut ReorderDrag {
        &mut self.drag
    }
}
