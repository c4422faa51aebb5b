//! 文档主题
//!
//! 主题是只读配置；应用主题时只覆盖版式字段（`PaperLayout`），不触碰题目或封面内容。

use phf::phf_map;
use serde::{Deserialize, Serialize};

use super::question::QuestionType;

/// 各题型题后留白（毫米）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeSpacing {
    pub multiple_choice: f64,
    pub true_false: f64,
    pub matching: f64,
    pub fill_in_blank: f64,
    pub numeric: f64,
    pub short_answer: f64,
    pub essay: f64,
    pub structured: f64,
    pub practical_oral: f64,
}

impl TypeSpacing {
    pub fn after(&self, question_type: QuestionType) -> f64 {
        match question_type {
            QuestionType::MultipleChoice => self.multiple_choice,
            QuestionType::TrueFalse => self.true_false,
            QuestionType::Matching => self.matching,
            QuestionType::FillInBlank => self.fill_in_blank,
            QuestionType::Numeric => self.numeric,
            QuestionType::ShortAnswer => self.short_answer,
            QuestionType::Essay => self.essay,
            QuestionType::Structured => self.structured,
            QuestionType::PracticalOral => self.practical_oral,
        }
    }
}

/// 主题记录（来自静态主题目录）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentTheme {
    pub name: &'static str,
    pub font_family: &'static str,
    pub font_size_pt: f64,
    pub line_height: f64,
    pub margin_mm: f64,
    pub spacing: TypeSpacing,
    /// 简答题默认行数
    pub short_answer_lines: u32,
    /// 论述题默认行数
    pub essay_lines: u32,
    pub show_marks: bool,
    pub show_examiner_column: bool,
}

static THEMES: phf::Map<&'static str, DocumentTheme> = phf_map! {
    "classic" => DocumentTheme {
        name: "classic",
        font_family: "\"Times New Roman\", \"SimSun\", serif",
        font_size_pt: 12.0,
        line_height: 1.5,
        margin_mm: 20.0,
        spacing: TypeSpacing {
            multiple_choice: 6.0,
            true_false: 4.0,
            matching: 8.0,
            fill_in_blank: 4.0,
            numeric: 6.0,
            short_answer: 6.0,
            essay: 10.0,
            structured: 8.0,
            practical_oral: 8.0,
        },
        short_answer_lines: 4,
        essay_lines: 12,
        show_marks: true,
        show_examiner_column: true,
    },
    "modern" => DocumentTheme {
        name: "modern",
        font_family: "\"Helvetica Neue\", Arial, \"Microsoft YaHei\", sans-serif",
        font_size_pt: 11.0,
        line_height: 1.4,
        margin_mm: 18.0,
        spacing: TypeSpacing {
            multiple_choice: 5.0,
            true_false: 3.0,
            matching: 6.0,
            fill_in_blank: 3.0,
            numeric: 5.0,
            short_answer: 5.0,
            essay: 8.0,
            structured: 6.0,
            practical_oral: 6.0,
        },
        short_answer_lines: 4,
        essay_lines: 10,
        show_marks: true,
        show_examiner_column: false,
    },
    "compact" => DocumentTheme {
        name: "compact",
        font_family: "Arial, \"SimHei\", sans-serif",
        font_size_pt: 10.0,
        line_height: 1.25,
        margin_mm: 12.0,
        spacing: TypeSpacing {
            multiple_choice: 3.0,
            true_false: 2.0,
            matching: 4.0,
            fill_in_blank: 2.0,
            numeric: 3.0,
            short_answer: 3.0,
            essay: 5.0,
            structured: 4.0,
            practical_oral: 4.0,
        },
        short_answer_lines: 3,
        essay_lines: 8,
        show_marks: false,
        show_examiner_column: false,
    },
};

/// 静态主题目录
pub struct ThemeCatalog;

impl ThemeCatalog {
    pub const DEFAULT: &'static str = "classic";

    pub fn get(name: &str) -> Option<&'static DocumentTheme> {
        THEMES.get(name.trim().to_lowercase().as_str())
    }

    pub fn default_theme() -> &'static DocumentTheme {
        &THEMES[Self::DEFAULT]
    }

    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = THEMES.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// 试卷版式字段（主题覆盖的就是这些）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperLayout {
    pub theme_name: String,
    pub font_family: String,
    pub font_size_pt: f64,
    pub line_height: f64,
    pub margin_mm: f64,
    pub spacing: TypeSpacing,
    pub short_answer_lines: u32,
    pub essay_lines: u32,
    pub show_marks: bool,
    pub show_examiner_column: bool,
}

impl PaperLayout {
    pub fn from_theme(theme: &DocumentTheme) -> Self {
        Self {
            theme_name: theme.name.to_string(),
            font_family: theme.font_family.to_string(),
            font_size_pt: theme.font_size_pt,
            line_height: theme.line_height,
            margin_mm: theme.margin_mm,
            spacing: theme.spacing,
            short_answer_lines: theme.short_answer_lines,
            essay_lines: theme.essay_lines,
            show_marks: theme.show_marks,
            show_examiner_column: theme.show_examiner_column,
        }
    }

    /// 整体替换为主题的版式
    pub fn apply_theme(&mut self, theme: &DocumentTheme) {
        *self = Self::from_theme(theme);
    }

    /// 正文行高（毫米）
    pub fn line_height_mm(&self) -> f64 {
        self.font_size_pt * PT_TO_MM * self.line_height
    }
}

impl Default for PaperLayout {
    fn default() -> Self {
        Self::from_theme(ThemeCatalog::default_theme())
    }
}

pub const PT_TO_MM: f64 = 25.4 / 72.0;
