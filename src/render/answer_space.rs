//! 作答区域策略
//!
//! 题型 → 作答区域的纯映射，不依赖页面状态。

use crate::models::question::{alpha_label, MatchingPair, QuestionEntity, QuestionPayload, QuestionType};
use crate::models::theme::PaperLayout;
use crate::render::html::escape_html;

/// 横线间距（毫米）
const RULED_LINE_MM: f64 = 8.0;
const NUMERIC_BOX_MM: f64 = 10.0;
const COMMENT_BOX_MM: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerSpace {
    /// A. B. C. 选项列表
    LetteredOptions(Vec<String>),
    /// 对 / 错 两个固定标记
    TrueFalseMarkers,
    /// 左列 1..n，右列 A..n，外加作答框
    MatchingGrid(Vec<MatchingPair>),
    /// 定宽作答框 + 可选单位
    NumericBox { unit: Option<String> },
    /// 横线作答区
    RuledBlock { lines: u32 },
    /// 评语框（实践 / 口试）
    CommentBox,
    /// 不预留空间（填空题、综合题）
    Nothing,
}

impl AnswerSpace {
    pub fn for_question(question: &QuestionEntity, layout: &PaperLayout) -> Self {
        match question.question_type {
            QuestionType::MultipleChoice => match &question.payload {
                Some(QuestionPayload::Options { options }) => AnswerSpace::LetteredOptions(options.clone()),
                _ => AnswerSpace::LetteredOptions(Vec::new()),
            },
            QuestionType::TrueFalse => AnswerSpace::TrueFalseMarkers,
            QuestionType::Matching => match &question.payload {
                Some(QuestionPayload::Matching { pairs }) => AnswerSpace::MatchingGrid(pairs.clone()),
                _ => AnswerSpace::MatchingGrid(Vec::new()),
            },
            QuestionType::FillInBlank | QuestionType::Structured => AnswerSpace::Nothing,
            QuestionType::Numeric => AnswerSpace::NumericBox {
                unit: question.unit.clone().filter(|u| !u.trim().is_empty()),
            },
            QuestionType::ShortAnswer => AnswerSpace::RuledBlock {
                lines: layout.short_answer_lines,
            },
            QuestionType::Essay => AnswerSpace::RuledBlock {
                lines: question.answer_lines.unwrap_or(layout.essay_lines),
            },
            QuestionType::PracticalOral => AnswerSpace::CommentBox,
        }
    }

    /// 估算高度（毫米）
    pub fn height_mm(&self, layout: &PaperLayout) -> f64 {
        let line = layout.line_height_mm();
        match self {
            AnswerSpace::LetteredOptions(options) => options.len() as f64 * line,
            AnswerSpace::TrueFalseMarkers => line,
            AnswerSpace::MatchingGrid(pairs) => pairs.len() as f64 * line * 1.2,
            AnswerSpace::NumericBox { .. } => NUMERIC_BOX_MM,
            AnswerSpace::RuledBlock { lines } => *lines as f64 * RULED_LINE_MM,
            AnswerSpace::CommentBox => COMMENT_BOX_MM,
            AnswerSpace::Nothing => 0.0,
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            AnswerSpace::LetteredOptions(options) => {
                let items: String = options
                    .iter()
                    .enumerate()
                    .map(|(i, text)| {
                        format!(
                            "<li><span class=\"opt-label\">{}.</span> {}</li>",
                            alpha_label(i, true),
                            escape_html(text)
                        )
                    })
                    .collect();
                format!("<ol class=\"options\">{}</ol>", items)
            }
            AnswerSpace::TrueFalseMarkers => {
                "<div class=\"true-false\"><span class=\"marker\">□ 对 (True)</span><span class=\"marker\">□ 错 (False)</span></div>"
                    .to_string()
            }
            AnswerSpace::MatchingGrid(pairs) => {
                let rows: String = pairs
                    .iter()
                    .enumerate()
                    .map(|(i, pair)| {
                        format!(
                            "<tr><td>{}. {}</td><td class=\"answer-box\"></td><td>{}. {}</td></tr>",
                            i + 1,
                            escape_html(&pair.left),
                            alpha_label(i, true),
                            escape_html(&pair.right)
                        )
                    })
                    .collect();
                format!("<table class=\"matching\">{}</table>", rows)
            }
            AnswerSpace::NumericBox { unit } => {
                let suffix = unit
                    .as_deref()
                    .map(|u| format!("<span class=\"unit\">{}</span>", escape_html(u)))
                    .unwrap_or_default();
                format!("<div class=\"numeric\"><span class=\"numeric-box\"></span>{}</div>", suffix)
            }
            AnswerSpace::RuledBlock { lines } => {
                let ruled = "<div class=\"ruled-line\"></div>".repeat(*lines as usize);
                format!("<div class=\"ruled\">{}</div>", ruled)
            }
            AnswerSpace::CommentBox => "<div class=\"comment-box\"></div>".to_string(),
            AnswerSpace::Nothing => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionId;

    fn question(question_type: QuestionType) -> QuestionEntity {
        QuestionEntity::new(QuestionId::new("q-1"), "题干", 2, question_type)
    }

    #[test]
    fn test_essay_uses_theme_default_or_override() {
        let layout = PaperLayout::default();
        let mut essay = question(QuestionType::Essay);
        assert_eq!(
            AnswerSpace::for_question(&essay, &layout),
            AnswerSpace::RuledBlock { lines: layout.essay_lines }
        );
        essay.answer_lines = Some(20);
        assert_eq!(AnswerSpace::for_question(&essay, &layout), AnswerSpace::RuledBlock { lines: 20 });
    }

    #[test]
    fn test_fill_in_blank_and_structured_reserve_nothing() {
        let layout = PaperLayout::default();
        for t in [QuestionType::FillInBlank, QuestionType::Structured] {
            let space = AnswerSpace::for_question(&question(t), &layout);
            assert_eq!(space, AnswerSpace::Nothing);
            assert_eq!(space.height_mm(&layout), 0.0);
            assert!(space.to_html().is_empty());
        }
    }

    #[test]
    fn test_options_are_lettered() {
        let layout = PaperLayout::default();
        let q = question(QuestionType::MultipleChoice).with_payload(QuestionPayload::Options {
            options: vec!["2".into(), "3".into(), "4".into()],
        });
        let html = AnswerSpace::for_question(&q, &layout).to_html();
        assert!(html.contains("A.</span> 2"));
        assert!(html.contains("C.</span> 4"));
    }

    #[test]
    fn test_matching_grid_numbers_left_and_letters_right() {
        let q = question(QuestionType::Matching).with_payload(QuestionPayload::Matching {
            pairs: vec![
                MatchingPair { left: "H2O".into(), right: "水".into() },
                MatchingPair { left: "NaCl".into(), right: "盐".into() },
            ],
        });
        let html = AnswerSpace::for_question(&q, &PaperLayout::default()).to_html();
        assert!(html.contains("1. H2O"));
        assert!(html.contains("B. 盐"));
        assert_eq!(html.matches("answer-box").count(), 2);
    }

    #[test]
    fn test_numeric_box_shows_unit() {
        let mut q = question(QuestionType::Numeric);
        q.unit = Some("m/s".into());
        let html = AnswerSpace::for_question(&q, &PaperLayout::default()).to_html();
        assert!(html.contains("numeric-box"));
        assert!(html.contains("m/s"));
    }
}
