//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责组卷流程的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、收尾）
//! - 恢复快照、准备题库、按模板或题库组卷
//! - 只在导出阶段持有 Browser
//! - 输出全局统计信息
//!
//! ### `composer_session` - 组卷会话
//! - 唯一修改题池的任务
//! - 选题后 spawn 补题，结果经 mpsc 回到会话再应用
//! - 主题、封面、模板分配、分页渲染
//!
//! ### `export_pipeline` - 导出流水线
//! - 逐页截图，失败页跳过
//! - 组装 PDF，广播导出进度
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! composer_session ──→ export_pipeline
//!     ↓                      ↓
//! workflow (题池 / 终稿 / 封面)   infrastructure (截图 / PDF)
//!     ↓
//! services (内容服务 / 补题 / 模板分配 / 快照)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一数据源**：终稿顺序只在 `PaperOrder` 中
//! 2. **资源隔离**：只有编排层持有 Browser
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure

pub mod app;
pub mod composer_session;
pub mod export_pipeline;

// 重新导出主要类型
pub use app::App;
pub use composer_session::ComposerSession;
pub use export_pipeline::{
    artifact_file_name, export_in_browser, ExportArtifact, ExportPipeline, ExportProgress,
};
