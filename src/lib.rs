//! # Exam Composer
//!
//! 组卷与导出引擎：从题库挑题、排序、排版封面，导出打印用的 PDF
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page、PDF 文档），只暴露能力
//! - `ChromeRasterizer` - 唯一的 page owner，把一页 HTML 截成位图
//! - `PdfAssembler` - 把位图逐页放进 A4 PDF
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LlmContentProvider` - 生成题目
//! - `Replenisher` - 补题
//! - `SectionAllocator` - 按模板分配大题
//! - `SnapshotService` - 快照与偏好设置
//! - `NoticeWriter` - 写 notices.txt
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 组卷过程的状态机
//! - `SelectionPipeline` - 题库 → 备选 → 终稿
//! - `PaperOrder` - 终稿顺序与自动编号
//! - `CoverCanvas` - 封面元素的拖动与缩放
//!
//! ### ④ 渲染层（Render）
//! - `render/` - 分页、作答区域、HTML，全部是纯函数
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/app` - 应用生命周期
//! - `orchestrator/composer_session` - 组卷会话
//! - `orchestrator/export_pipeline` - 导出流水线
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::open_browser;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{PaperMetadata, QuestionEntity, QuestionId, QuestionType};
pub use orchestrator::{App, ComposerSession, ExportPipeline};
pub use workflow::{CoverCanvas, PaperOrder, SelectionPipeline};
