//! 页面 HTML
//!
//! 每个 `PageDescriptor` 渲染成一份独立的 HTML 文档（210×297mm），
//! 交给导出流水线截图。

use crate::models::cover::{CoverElement, CoverElementKind, Dimension};
use crate::models::paper::{PageDescriptor, PageItem, PageKind, PlacedQuestion};
use crate::models::question::alpha_label;
use crate::models::theme::PaperLayout;
use crate::render::answer_space::AnswerSpace;
use crate::render::paginate::EXAMINER_COLUMN_MM;

/// 渲染好的单页
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// 从 1 开始
    pub page_number: usize,
    pub html: String,
}

/// 纯文本转义（题干本身是 HTML 片段，不经过这里）
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn marks_suffix(marks: u32, layout: &PaperLayout) -> String {
    if layout.show_marks {
        format!(" <span class=\"marks\">[{}]</span>", marks)
    } else {
        String::new()
    }
}

fn page_css(page: &PageDescriptor, layout: &PaperLayout) -> String {
    format!(
        r#"@page {{ size: {w}mm {h}mm; margin: 0; }}
html, body {{ margin: 0; padding: 0; background: #fff; }}
.page {{ position: relative; width: {w}mm; height: {h}mm; padding: {m}mm; box-sizing: border-box; overflow: hidden;
  font-family: {font}; font-size: {size}pt; line-height: {lh}; color: #000; }}
.section-heading {{ font-weight: bold; margin: 4mm 0 2mm; }}
.question-row {{ display: flex; }}
.question {{ flex: 1; }}
.examiner-col {{ width: {ex}mm; border-left: 1px solid #999; font-size: 8pt; color: #666; text-align: center; }}
.marks {{ float: right; }}
.options {{ list-style: none; padding-left: 6mm; margin: 1mm 0; }}
.true-false .marker {{ margin-right: 12mm; }}
.matching td {{ padding: 1mm 3mm; }}
.matching .answer-box {{ width: 10mm; border: 1px solid #000; }}
.numeric-box {{ display: inline-block; width: 40mm; height: 8mm; border: 1px solid #000; vertical-align: middle; }}
.unit {{ margin-left: 2mm; }}
.ruled-line {{ height: 8mm; border-bottom: 1px solid #999; }}
.comment-box {{ height: 30mm; border: 1px solid #000; }}
.sub-part {{ margin: 1mm 0 1mm 6mm; }}
.figure img {{ max-width: 100%; max-height: 40mm; }}
.cover-el {{ position: absolute; box-sizing: border-box; }}
.cover-el.bordered {{ border: 1px solid #000; padding: 2mm; }}
"#,
        w = page.width_mm,
        h = page.height_mm,
        m = page.margin_mm,
        font = layout.font_family,
        size = layout.font_size_pt,
        lh = layout.line_height,
        ex = EXAMINER_COLUMN_MM,
    )
}

/// 单个题目的 HTML 块（预览列表也复用它）
pub fn question_block(placed: &PlacedQuestion, layout: &PaperLayout) -> String {
    let question = &placed.question;
    let mut inner = format!(
        "<div class=\"stem\"><span class=\"number\">{}.</span> {}{}</div>",
        placed.number,
        question.body,
        marks_suffix(question.marks, layout)
    );

    if let Some((src, caption)) = question.image() {
        inner.push_str(&format!("<div class=\"figure\"><img src=\"{}\">", escape_html(src)));
        if let Some(caption) = caption {
            inner.push_str(&format!("<div class=\"caption\">{}</div>", escape_html(caption)));
        }
        inner.push_str("</div>");
    }

    // 小题序号按位置重新生成
    if let Some(parts) = question.sub_parts() {
        for (i, part) in parts.iter().enumerate() {
            inner.push_str(&format!(
                "<div class=\"sub-part\">({}) {}{}</div>",
                alpha_label(i, false),
                part.body,
                marks_suffix(part.marks, layout)
            ));
        }
    }

    inner.push_str(&AnswerSpace::for_question(question, layout).to_html());

    let examiner = if layout.show_examiner_column {
        "<div class=\"examiner-col\">阅卷人</div>"
    } else {
        ""
    };
    format!(
        "<div class=\"question-row\" data-id=\"{}\" style=\"margin-bottom: {}mm\"><div class=\"question\">{}</div>{}</div>",
        escape_html(question.id.as_str()),
        layout.spacing.after(question.question_type),
        inner,
        examiner
    )
}

fn dimension_css(property: &str, dimension: Dimension) -> String {
    match dimension {
        Dimension::Auto => String::new(),
        Dimension::Explicit(pct) => format!("{}: {}%;", property, pct),
    }
}

fn cover_element(element: &CoverElement) -> String {
    let g = &element.geometry;
    let style = &element.style;
    let mut css = format!(
        "left: {}%; top: {}%; {}{}font-size: {}pt; text-align: {};",
        g.x,
        g.y,
        dimension_css("width", g.width),
        dimension_css("height", g.height),
        style.font_size_pt,
        style.align.css()
    );
    if style.bold {
        css.push_str(" font-weight: bold;");
    }

    let bordered = style.border || element.kind == CoverElementKind::Frame;
    let class = if bordered { "cover-el bordered" } else { "cover-el" };
    let content = match element.kind {
        CoverElementKind::Field => format!("{}：________________", escape_html(&element.content)),
        _ => escape_html(&element.content).replace('\n', "<br>"),
    };
    format!(
        "<div class=\"{}\" data-id=\"{}\" style=\"{}\">{}</div>",
        class, element.id, css, content
    )
}

fn page_body(page: &PageDescriptor, layout: &PaperLayout, cover: &[CoverElement]) -> String {
    match page.kind {
        PageKind::Cover => cover.iter().map(cover_element).collect(),
        PageKind::Content => page
            .items
            .iter()
            .map(|item| match item {
                PageItem::SectionHeading { label, total_marks } => format!(
                    "<div class=\"section-heading\">{}{}</div>",
                    escape_html(label),
                    marks_suffix(*total_marks, layout)
                ),
                PageItem::Question(placed) => question_block(placed, layout),
            })
            .collect(),
    }
}

pub fn render_page(page: &PageDescriptor, layout: &PaperLayout, title: &str, cover: &[CoverElement]) -> RenderedPage {
    let html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{} - {}</title><style>{}</style></head><body><div class=\"page\">{}</div></body></html>",
        escape_html(title),
        page.page_number,
        page_css(page, layout),
        page_body(page, layout, cover)
    );
    RenderedPage {
        page_number: page.page_number,
        html,
    }
}

pub fn render_document(
    pages: &[PageDescriptor],
    layout: &PaperLayout,
    title: &str,
    cover: &[CoverElement],
) -> Vec<RenderedPage> {
    pages
        .iter()
        .map(|page| render_page(page, layout, title, cover))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cover::{default_cover, ElementId, Geometry};
    use crate::models::paper::PaperMetadata;
    use crate::models::question::{QuestionEntity, QuestionId, QuestionType};
    use crate::models::theme::ThemeCatalog;

    fn composite() -> PlacedQuestion {
        let mut q = QuestionEntity::new(QuestionId::new("q-7"), "<p>阅读材料</p>", 1, QuestionType::Structured);
        q.add_sub_part("概括", 2);
        q.add_sub_part("分析", 3);
        q.add_sub_part("评价", 1);
        PlacedQuestion { number: 4, question: q }
    }

    #[test]
    fn test_marks_suffix_follows_theme() {
        let placed = composite();
        let classic = PaperLayout::default();
        assert!(question_block(&placed, &classic).contains("[6]"));

        let compact = PaperLayout::from_theme(ThemeCatalog::get("compact").unwrap());
        assert!(!question_block(&placed, &compact).contains("[6]"));
    }

    #[test]
    fn test_sub_part_labels_follow_position() {
        let mut placed = composite();
        let html = question_block(&placed, &PaperLayout::default());
        assert!(html.contains("(a) 概括"));
        assert!(html.contains("(c) 评价"));

        placed.question.remove_sub_part(0);
        let html = question_block(&placed, &PaperLayout::default());
        assert!(html.contains("(a) 分析"));
        assert!(!html.contains("(c)"));
        assert!(html.contains("[4]"));
    }

    #[test]
    fn test_page_padding_comes_from_descriptor() {
        let layout = PaperLayout::default();
        let page = PageDescriptor::new(2, PageKind::Content, layout.margin_mm + 7.5);
        let html = render_page(&page, &layout, "期中", &[]).html;
        assert!(html.contains(&format!("padding: {}mm", layout.margin_mm + 7.5)));
        assert!(html.contains("size: 210mm 297mm"));
    }

    #[test]
    fn test_examiner_column_only_when_enabled() {
        let placed = composite();
        assert!(question_block(&placed, &PaperLayout::default()).contains("阅卷人"));
        let modern = PaperLayout::from_theme(ThemeCatalog::get("modern").unwrap());
        assert!(!question_block(&placed, &modern).contains("阅卷人"));
    }

    #[test]
    fn test_cover_elements_are_positioned_by_percent() {
        let mut cover = default_cover(&PaperMetadata::default());
        cover.push(CoverElement::new(ElementId(9), CoverElementKind::Text, Geometry::at(5.0, 95.0), "<b>"));
        let page = PageDescriptor::new(1, PageKind::Cover, 20.0);
        let rendered = render_page(&page, &PaperLayout::default(), "期中", &cover);

        assert!(rendered.html.contains("left: 5%; top: 95%;"));
        assert!(rendered.html.contains("&lt;b&gt;"));
        assert!(rendered.html.contains("姓名："));
        assert!(rendered.html.contains("size: 210mm 297mm"));
    }
}
