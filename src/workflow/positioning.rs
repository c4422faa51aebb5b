//! 封面自由排版 - 交互状态机
//!
//! 每个元素独立维护自己的交互状态：
//!
//! ```text
//! Idle -> Dragging -> Idle
//! Idle -> Resizing -> Idle
//! Idle <-> TextEditing        （仅文字类元素，与拖动/缩放互斥）
//! ```
//!
//! 几何变化由纯函数 [`reduce`] 计算，不依赖任何具体的指针事件库。

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::models::cover::{
    clamp_anchor, CoverElement, CoverElementKind, Dimension, ElementId, Geometry, MIN_SIZE_PCT,
};
use crate::workflow::reorder_drag::PointerPos;

/// 容器当前的像素尺寸
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    pub width_px: f64,
    pub height_px: f64,
}

impl ContainerRect {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self { width_px, height_px }
    }

    fn dx_pct(&self, dx_px: f64) -> f64 {
        if self.width_px > 0.0 {
            dx_px / self.width_px * 100.0
        } else {
            0.0
        }
    }

    fn dy_pct(&self, dy_px: f64) -> f64 {
        if self.height_px > 0.0 {
            dy_px / self.height_px * 100.0
        } else {
            0.0
        }
    }
}

/// 元素实际渲染出来的像素尺寸（用于把 Auto 换算成百分比）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizePx {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    /// 只改宽度
    Right,
    /// 只改高度
    Bottom,
    /// 同时改宽高
    Corner,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    Dragging {
        pointer_start: PointerPos,
        start_x: f64,
        start_y: f64,
    },
    Resizing {
        handle: ResizeHandle,
        pointer_start: PointerPos,
        start_width: f64,
        start_height: f64,
    },
    TextEditing,
}

impl InteractionState {
    /// 拖动 / 缩放期间需要监听全局指针事件
    pub fn tracks_globally(&self) -> bool {
        matches!(self, InteractionState::Dragging { .. } | InteractionState::Resizing { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoverEvent {
    PointerDown {
        pos: PointerPos,
        handle: Option<ResizeHandle>,
        measured: SizePx,
    },
    PointerMove {
        pos: PointerPos,
    },
    PointerUp,
    BeginTextEdit,
    EndTextEdit,
}

/// 纯函数：根据当前状态和事件计算新的状态与几何
///
/// 锚点始终收敛在 [0, 99]；尺寸下限 2%，无上限。
pub fn reduce(
    state: InteractionState,
    geometry: Geometry,
    event: CoverEvent,
    container: ContainerRect,
    text_editable: bool,
) -> (InteractionState, Geometry) {
    match (state, event) {
        (InteractionState::Idle, CoverEvent::PointerDown { pos, handle: None, .. }) => (
            InteractionState::Dragging {
                pointer_start: pos,
                start_x: geometry.x,
                start_y: geometry.y,
            },
            geometry,
        ),
        (InteractionState::Idle, CoverEvent::PointerDown { pos, handle: Some(handle), measured }) => {
            let start_width = geometry
                .width
                .explicit()
                .unwrap_or_else(|| container.dx_pct(measured.width));
            let start_height = geometry
                .height
                .explicit()
                .unwrap_or_else(|| container.dy_pct(measured.height));
            (
                InteractionState::Resizing {
                    handle,
                    pointer_start: pos,
                    start_width,
                    start_height,
                },
                geometry,
            )
        }
        (
            InteractionState::Dragging { pointer_start, start_x, start_y },
            CoverEvent::PointerMove { pos },
        ) => {
            let mut next = geometry;
            next.x = clamp_anchor(start_x + container.dx_pct(pos.x - pointer_start.x));
            next.y = clamp_anchor(start_y + container.dy_pct(pos.y - pointer_start.y));
            (state, next)
        }
        (
            InteractionState::Resizing { handle, pointer_start, start_width, start_height },
            CoverEvent::PointerMove { pos },
        ) => {
            let mut next = geometry;
            let width = (start_width + container.dx_pct(pos.x - pointer_start.x)).max(MIN_SIZE_PCT);
            let height = (start_height + container.dy_pct(pos.y - pointer_start.y)).max(MIN_SIZE_PCT);
            if matches!(handle, ResizeHandle::Right | ResizeHandle::Corner) {
                next.width = Dimension::Explicit(width);
            }
            if matches!(handle, ResizeHandle::Bottom | ResizeHandle::Corner) {
                next.height = Dimension::Explicit(height);
            }
            (state, next)
        }
        (InteractionState::Dragging { .. } | InteractionState::Resizing { .. }, CoverEvent::PointerUp) => {
            (InteractionState::Idle, geometry)
        }
        (InteractionState::Idle, CoverEvent::BeginTextEdit) if text_editable => {
            (InteractionState::TextEditing, geometry)
        }
        (InteractionState::TextEditing, CoverEvent::EndTextEdit) => (InteractionState::Idle, geometry),
        // 编辑文字时不响应拖动/缩放，其余组合一律忽略
        (state, _) => (state, geometry),
    }
}

/// 封面画布
pub struct CoverCanvas {
    elements: Vec<CoverElement>,
    states: HashMap<ElementId, InteractionState>,
    /// 当前挂在全局指针上的元素
    global_listeners: BTreeSet<ElementId>,
    container: ContainerRect,
    next_id: u32,
}

impl CoverCanvas {
    pub fn new(elements: Vec<CoverElement>, container: ContainerRect) -> Self {
        let next_id = elements.iter().map(|e| e.id.0).max().unwrap_or(0) + 1;
        Self {
            elements,
            states: HashMap::new(),
            global_listeners: BTreeSet::new(),
            container,
            next_id,
        }
    }

    pub fn elements(&self) -> &[CoverElement] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<CoverElement> {
        self.elements
    }

    pub fn element(&self, id: ElementId) -> Option<&CoverElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn state(&self, id: ElementId) -> InteractionState {
        self.states.get(&id).copied().unwrap_or(InteractionState::Idle)
    }

    /// 容器尺寸变化（如窗口缩放），后续换算按新尺寸进行
    pub fn set_container(&mut self, container: ContainerRect) {
        self.container = container;
    }

    pub fn is_listening_globally(&self, id: ElementId) -> bool {
        self.global_listeners.contains(&id)
    }

    pub fn global_listener_count(&self) -> usize {
        self.global_listeners.len()
    }

    /// 分发事件到指定元素，返回元素是否存在
    pub fn handle(&mut self, id: ElementId, event: CoverEvent) -> bool {
        let Some(element) = self.elements.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        let state = self.states.get(&id).copied().unwrap_or(InteractionState::Idle);
        let (next_state, geometry) = reduce(
            state,
            element.geometry,
            event,
            self.container,
            element.kind.is_text_editable(),
        );
        element.geometry = geometry;

        if next_state.tracks_globally() {
            if self.global_listeners.insert(id) {
                debug!("{} 开始跟踪全局指针", id);
            }
        } else if self.global_listeners.remove(&id) {
            debug!("{} 停止跟踪全局指针", id);
        }

        if next_state == InteractionState::Idle {
            self.states.remove(&id);
        } else {
            self.states.insert(id, next_state);
        }
        true
    }

    /// 编辑中的文字元素才能改内容
    pub fn update_text(&mut self, id: ElementId, text: impl Into<String>) -> bool {
        if self.state(id) != InteractionState::TextEditing {
            return false;
        }
        match self.elements.iter_mut().find(|e| e.id == id) {
            Some(element) => {
                element.content = text.into();
                true
            }
            None => false,
        }
    }

    /// 按试卷信息同步元素内容，几何和交互状态不变
    ///
    /// 已删除的元素不会被重新创建。
    pub fn sync_content(&mut self, id: ElementId, text: impl Into<String>) -> bool {
        match self.elements.iter_mut().find(|e| e.id == id) {
            Some(element) => {
                element.content = text.into();
                true
            }
            None => false,
        }
    }

    pub fn add_element(&mut self, kind: CoverElementKind, content: impl Into<String>) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements
            .push(CoverElement::new(id, kind, Geometry::at(10.0, 80.0), content));
        id
    }

    /// 立即删除，不可恢复
    pub fn delete_element(&mut self, id: ElementId) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        self.states.remove(&id);
        self.global_listeners.remove(&id);
        before != self.elements.len()
    }
}
