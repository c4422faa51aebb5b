//! 渲染层
//!
//! 主题 + 题目 → 页面描述 → HTML。全部是纯函数。

pub mod answer_space;
pub mod html;
pub mod paginate;

pub use answer_space::AnswerSpace;
pub use html::{escape_html, question_block, render_document, render_page, RenderedPage};
pub use paginate::{estimate_question_height, paginate};
