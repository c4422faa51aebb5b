//! 流程层
//!
//! 组卷过程中的状态机：三级题池、终稿顺序、两个列表视图、封面排版。

pub mod paper_order;
pub mod positioning;
pub mod reorder_drag;
pub mod selection;
pub mod views;

pub use paper_order::{OrderSnapshot, PaperOrder};
pub use positioning::{
    reduce, ContainerRect, CoverCanvas, CoverEvent, InteractionState, ResizeHandle, SizePx,
};
pub use reorder_drag::{DragOutcome, DragPhase, PointerPos, ReorderDrag};
pub use selection::{ReplenishmentOutcome, ReplenishmentRequest, SelectionPipeline};
pub use views::{apply_outcome, ControlListView, OrderView, PreviewListView, Reorderable};
