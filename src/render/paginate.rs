//! 分页
//!
//! 按终稿顺序把题目排进 A4 页面。高度是估算值，
//! 只要求不把题目切到两页之间，不追求与浏览器排版逐像素一致。

use tracing::debug;

use crate::models::paper::{PageDescriptor, PageItem, PageKind, PlacedQuestion, PAGE_WIDTH_MM};
use crate::models::question::QuestionEntity;
use crate::models::template::SectionAllocation;
use crate::models::theme::{PaperLayout, PT_TO_MM};
use crate::render::answer_space::AnswerSpace;

/// 大题标题占用高度（毫米）
const HEADING_MM: f64 = 12.0;
/// 阅卷栏宽度（毫米）
pub const EXAMINER_COLUMN_MM: f64 = 20.0;
const IMAGE_MM: f64 = 40.0;

/// 去掉 HTML 标签后的纯文本字符数
fn visible_chars(html: &str) -> usize {
    let mut in_tag = false;
    let mut count = 0;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => count += 1,
            _ => {}
        }
    }
    count
}

fn text_height_mm(chars: usize, text_width_mm: f64, layout: &PaperLayout) -> f64 {
    // 按全角字宽估算，偏保守
    let char_mm = (layout.font_size_pt * PT_TO_MM).max(0.1);
    let per_line = (text_width_mm / char_mm).floor().max(1.0) as usize;
    let lines = chars.div_ceil(per_line).max(1);
    lines as f64 * layout.line_height_mm()
}

/// 估算单个题目的高度（毫米）
pub fn estimate_question_height(question: &QuestionEntity, layout: &PaperLayout) -> f64 {
    let mut text_width = PAGE_WIDTH_MM - 2.0 * layout.margin_mm;
    if layout.show_examiner_column {
        text_width -= EXAMINER_COLUMN_MM;
    }

    let mut height = text_height_mm(visible_chars(&question.body), text_width, layout);
    if let Some(parts) = question.sub_parts() {
        for part in parts {
            height += text_height_mm(visible_chars(&part.body) + 4, text_width, layout);
        }
    }
    if question.image().is_some() {
        height += IMAGE_MM;
    }
    height += AnswerSpace::for_question(question, layout).height_mm(layout);
    height + layout.spacing.after(question.question_type)
}

/// 把终稿排进页面
///
/// - `with_cover` 为 true 时第一个描述符是封面
/// - `sections` 用于插入大题标题，标题始终和它的第一题在同一页
/// - 超过一页高度的题目独占一页
pub fn paginate(
    questions: &[PlacedQuestion],
    layout: &PaperLayout,
    sections: Option<&SectionAllocation>,
    with_cover: bool,
) -> Vec<PageDescriptor> {
    let mut pages = Vec::new();
    if with_cover {
        pages.push(PageDescriptor::new(1, PageKind::Cover, layout.margin_mm));
    }

    let mut current = PageDescriptor::new(pages.len() + 1, PageKind::Content, layout.margin_mm);
    let printable = current.printable_height_mm();
    let mut used = 0.0;
    let mut last_section: Option<usize> = None;

    for placed in questions {
        let section = sections.and_then(|s| s.section_of(&placed.question.id));
        let heading = match (section, sections) {
            (Some(index), Some(allocation)) if last_section != Some(index) => {
                let s = &allocation.sections[index];
                Some(PageItem::SectionHeading {
                    label: s.label.clone(),
                    total_marks: s.total_marks(),
                })
            }
            _ => None,
        };
        if section.is_some() {
            last_section = section;
        }

        let height = estimate_question_height(&placed.question, layout);
        let heading_height = if heading.is_some() { HEADING_MM } else { 0.0 };

        if used > 0.0 && used + heading_height + height > printable {
            let next = PageDescriptor::new(current.page_number + 1, PageKind::Content, layout.margin_mm);
            pages.push(std::mem::replace(&mut current, next));
            used = 0.0;
        }
        if height > printable {
            debug!("第 {} 题超过一页高度，独占一页", placed.number);
        }

        if let Some(heading) = heading {
            current.items.push(heading);
            used += heading_height;
        }
        current.items.push(PageItem::Question(placed.clone()));
        used += height;
    }

    if !current.items.is_empty() {
        pages.push(current);
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{QuestionId, QuestionType};
    use crate::models::template::AllocatedSection;

    fn placed(n: u32, body_len: usize, t: QuestionType) -> PlacedQuestion {
        PlacedQuestion {
            number: n,
            question: QuestionEntity::new(QuestionId::new(format!("q-{}", n)), "字".repeat(body_len), 2, t),
        }
    }

    fn numbers(page: &PageDescriptor) -> Vec<u32> {
        page.questions().map(|p| p.number).collect()
    }

    #[test]
    fn test_cover_is_first_descriptor() {
        let pages = paginate(&[placed(1, 10, QuestionType::TrueFalse)], &PaperLayout::default(), None, true);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].kind, PageKind::Cover);
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(numbers(&pages[1]), vec![1]);
    }

    #[test]
    fn test_questions_flow_onto_new_pages_in_order() {
        let layout = PaperLayout::default();
        let questions: Vec<_> = (1..=12).map(|n| placed(n, 40, QuestionType::Essay)).collect();
        let pages = paginate(&questions, &layout, None, false);
        assert!(pages.len() > 1);

        let flat: Vec<u32> = pages.iter().flat_map(numbers).collect();
        assert_eq!(flat, (1..=12).collect::<Vec<_>>());
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.page_number, i + 1);
        }
    }

    #[test]
    fn test_oversized_question_gets_its_own_page() {
        let layout = PaperLayout::default();
        let questions = vec![
            placed(1, 10, QuestionType::TrueFalse),
            placed(2, 20_000, QuestionType::ShortAnswer),
            placed(3, 10, QuestionType::TrueFalse),
        ];
        let pages = paginate(&questions, &layout, None, false);
        assert_eq!(pages.len(), 3);
        assert_eq!(numbers(&pages[1]), vec![2]);
    }

    #[test]
    fn test_section_heading_stays_with_first_question() {
        let layout = PaperLayout::default();
        let first = placed(1, 2_500, QuestionType::ShortAnswer);
        let second = placed(2, 10, QuestionType::TrueFalse);
        let allocation = SectionAllocation {
            sections: vec![
                AllocatedSection {
                    label: "一、简答题".into(),
                    question_type: QuestionType::ShortAnswer,
                    questions: vec![first.question.clone()],
                },
                AllocatedSection {
                    label: "二、判断题".into(),
                    question_type: QuestionType::TrueFalse,
                    questions: vec![second.question.clone()],
                },
            ],
            complete: true,
            warnings: Vec::new(),
        };

        let pages = paginate(&[first, second], &layout, Some(&allocation), false);
        for page in &pages {
            if let Some(PageItem::SectionHeading { .. }) = page.items.last() {
                panic!("标题不能落在页尾");
            }
        }
        let headings: Vec<&str> = pages
            .iter()
            .flat_map(|p| p.items.iter())
            .filter_map(|item| match item {
                PageItem::SectionHeading { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(headings, vec!["一、简答题", "二、判断题"]);
    }

    #[test]
    fn test_visible_chars_ignores_tags() {
        assert_eq!(visible_chars("<p>a<b>bc</b></p>"), 3);
    }
}
