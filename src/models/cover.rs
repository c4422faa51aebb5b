//! 封面元素
//!
//! 几何信息全部使用相对容器的百分比，锚点 x/y 限定在 [0, 99]。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::paper::PaperMetadata;

/// 锚点允许的最大百分比
pub const MAX_ANCHOR_PCT: f64 = 99.0;
/// 任一尺寸的最小百分比
pub const MIN_SIZE_PCT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el-{}", self.0)
    }
}

/// 封面元素类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverElementKind {
    Text,
    /// 待填写的栏目（姓名、考号等）
    Field,
    /// 方框（如总分栏）
    #[serde(rename = "box")]
    Frame,
    Instructions,
}

impl CoverElementKind {
    /// 是否支持就地编辑文字
    pub fn is_text_editable(self) -> bool {
        matches!(self, CoverElementKind::Text | CoverElementKind::Instructions)
    }
}

/// 尺寸：自动或显式百分比
///
/// 首次手动调整尺寸后由 `Auto` 变为 `Explicit`，不会再变回。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "pct", rename_all = "snake_case")]
pub enum Dimension {
    #[default]
    Auto,
    Explicit(f64),
}

impl Dimension {
    pub fn explicit(self) -> Option<f64> {
        match self {
            Dimension::Auto => None,
            Dimension::Explicit(pct) => Some(pct),
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, Dimension::Auto)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: Dimension,
    #[serde(default)]
    pub height: Dimension,
}

impl Geometry {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: clamp_anchor(x),
            y: clamp_anchor(y),
            width: Dimension::Auto,
            height: Dimension::Auto,
        }
    }

    pub fn with_width(mut self, pct: f64) -> Self {
        self.width = Dimension::Explicit(pct.max(MIN_SIZE_PCT));
        self
    }

    pub fn with_height(mut self, pct: f64) -> Self {
        self.height = Dimension::Explicit(pct.max(MIN_SIZE_PCT));
        self
    }
}

/// 锚点越界时静默收敛
pub fn clamp_anchor(pct: f64) -> f64 {
    if pct.is_nan() {
        return 0.0;
    }
    pct.clamp(0.0, MAX_ANCHOR_PCT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    pub font_size_pt: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub border: bool,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            font_size_pt: 12.0,
            bold: false,
            align: TextAlign::Left,
            border: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverElement {
    pub id: ElementId,
    pub kind: CoverElementKind,
    pub geometry: Geometry,
    #[serde(default)]
    pub style: ElementStyle,
    #[serde(default)]
    pub content: String,
}

impl CoverElement {
    pub fn new(id: ElementId, kind: CoverElementKind, geometry: Geometry, content: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            geometry,
            style: ElementStyle::default(),
            content: content.into(),
        }
    }

    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }
}

/// 默认封面中随试卷信息变化的元素
pub const TITLE_ELEMENT: ElementId = ElementId(1);
pub const SUBJECT_ELEMENT: ElementId = ElementId(2);
pub const INSTRUCTIONS_ELEMENT: ElementId = ElementId(5);

/// 科目行：`物理（考试时间 90 分钟）`
pub fn subject_line(metadata: &PaperMetadata) -> String {
    match metadata.duration_minutes {
        Some(minutes) => format!("{}（考试时间 {} 分钟）", metadata.subject, minutes),
        None => metadata.subject.clone(),
    }
}

/// 默认封面元素：标题、科目、姓名栏、考号栏、考试说明、总分框
pub fn default_cover(metadata: &PaperMetadata) -> Vec<CoverElement> {
    let title_style = ElementStyle {
        font_size_pt: 24.0,
        bold: true,
        align: TextAlign::Center,
        border: false,
    };
    let subject_style = ElementStyle {
        font_size_pt: 16.0,
        align: TextAlign::Center,
        ..ElementStyle::default()
    };
    let boxed = ElementStyle {
        border: true,
        ..ElementStyle::default()
    };

    vec![
        CoverElement::new(TITLE_ELEMENT, CoverElementKind::Text, Geometry::at(10.0, 12.0).with_width(80.0), &metadata.title)
            .with_style(title_style),
        CoverElement::new(
            SUBJECT_ELEMENT,
            CoverElementKind::Text,
            Geometry::at(10.0, 22.0).with_width(80.0),
            subject_line(metadata),
        )
        .with_style(subject_style),
        CoverElement::new(ElementId(3), CoverElementKind::Field, Geometry::at(10.0, 36.0).with_width(50.0), "姓名"),
        CoverElement::new(ElementId(4), CoverElementKind::Field, Geometry::at(10.0, 42.0).with_width(50.0), "考号"),
        CoverElement::new(
            INSTRUCTIONS_ELEMENT,
            CoverElementKind::Instructions,
            Geometry::at(10.0, 52.0).with_width(80.0),
            &metadata.instructions,
        ),
        CoverElement::new(
            ElementId(6),
            CoverElementKind::Frame,
            Geometry::at(65.0, 34.0).with_width(25.0).with_height(12.0),
            "总分",
        )
        .with_style(boxed),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_anchor() {
        assert_eq!(clamp_anchor(145.0), 99.0);
        assert_eq!(clamp_anchor(-3.0), 0.0);
        assert_eq!(clamp_anchor(f64::NAN), 0.0);
    }

    #[test]
    fn test_default_cover_starts_with_auto_heights_for_text() {
        let cover = default_cover(&PaperMetadata::default());
        assert_eq!(cover.len(), 6);
        assert!(cover[0].geometry.height.is_auto());
        assert_eq!(cover[5].geometry.height, Dimension::Explicit(12.0));
    }

    #[test]
    fn test_dimension_serde_shape() {
        let json = serde_json::to_string(&Dimension::Explicit(12.5)).unwrap();
        assert_eq!(json, r#"{"mode":"explicit","pct":12.5}"#);
        let auto: Dimension = serde_json::from_str(r#"{"mode":"auto"}"#).unwrap();
        assert!(auto.is_auto());
    }
}
