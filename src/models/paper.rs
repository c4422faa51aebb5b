use serde::{Deserialize, Serialize};

use super::question::QuestionEntity;

/// A4 纸张尺寸（毫米）
pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;

/// 试卷元信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub curriculum: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub instructions: String,
}

impl Default for PaperMetadata {
    fn default() -> Self {
        Self {
            title: "未命名试卷".to_string(),
            subject: String::new(),
            curriculum: String::new(),
            duration_minutes: None,
            instructions: "请在规定时间内完成全部题目，答案写在指定区域内。".to_string(),
        }
    }
}

/// 已编号的题目（终稿列表中的一项）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedQuestion {
    /// 显示序号，始终等于下标 + 1
    pub number: u32,
    pub question: QuestionEntity,
}

/// 页面上的一项
#[derive(Debug, Clone, PartialEq)]
pub enum PageItem {
    /// 大题标题（来自组卷模板）
    SectionHeading { label: String, total_marks: u32 },
    Question(PlacedQuestion),
}

/// 页面类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Cover,
    Content,
}

/// 页面描述：固定 A4，边距来自主题
#[derive(Debug, Clone, PartialEq)]
pub struct PageDescriptor {
    /// 页码（从 1 开始，封面为第 1 页）
    pub page_number: usize,
    pub kind: PageKind,
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
    pub items: Vec<PageItem>,
}

impl PageDescriptor {
    pub fn new(page_number: usize, kind: PageKind, margin_mm: f64) -> Self {
        Self {
            page_number,
            kind,
            width_mm: PAGE_WIDTH_MM,
            height_mm: PAGE_HEIGHT_MM,
            margin_mm,
            items: Vec::new(),
        }
    }

    /// 可用排版高度（毫米）
    pub fn printable_height_mm(&self) -> f64 {
        self.height_mm - 2.0 * self.margin_mm
    }

    pub fn questions(&self) -> impl Iterator<Item = &PlacedQuestion> {
        self.items.iter().filter_map(|item| match item {
            PageItem::Question(q) => Some(q),
            PageItem::SectionHeading { .. } => None,
        })
    }
}
