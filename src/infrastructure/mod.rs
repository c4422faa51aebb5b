//! 基础设施层
//!
//! 持有稀缺资源（浏览器 Page、PDF 文档），只暴露能力，不认识题目或流程。

pub mod page_capturer;
pub mod pdf_assembler;

pub use page_capturer::{ChromeRasterizer, FontStripper, PageRasterizer, PAGE_HEIGHT_PX, PAGE_WIDTH_PX};
pub use pdf_assembler::PdfAssembler;
