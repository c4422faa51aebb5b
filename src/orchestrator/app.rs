//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 管理一次组卷的完整生命周期：
//!
//! 1. **初始化**：提示日志、快照与偏好设置、内容服务、组卷会话
//! 2. **题库**：有快照时恢复终稿，否则读入手工题目并向内容服务要一批题
//! 3. **组卷**：有模板时按模板分配，否则把可见题库全部放进终稿
//! 4. **导出**：渲染、逐页截图、组装 PDF、写入导出目录
//! 5. **收尾**：等待补题完成，按配置保存快照，输出统计
//!
//! 浏览器只在导出阶段打开，是唯一持有 Browser 的地方。

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::loaders::{load_question_folder, load_template};
use crate::models::snapshot::Preferences;
use crate::orchestrator::composer_session::ComposerSession;
use crate::orchestrator::export_pipeline::{export_in_browser, ExportArtifact};
use crate::services::content_provider::LlmContentProvider;
use crate::services::notice_writer::{NoticeKind, NoticeWriter};
use crate::services::snapshot_store::{FileKeyValueStore, LoadedSnapshot, SnapshotService};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    notices: Arc<NoticeWriter>,
    snapshots: SnapshotService<FileKeyValueStore>,
    restored: Option<LoadedSnapshot>,
    session: ComposerSession<LlmContentProvider>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config.theme_name, config.bank_size);

        let notices = Arc::new(NoticeWriter::with_path(
            Path::new(&config.data_dir).join("notices.txt"),
        ));
        let snapshots = SnapshotService::new(FileKeyValueStore::new(&config.data_dir));

        let loaded = snapshots.load_snapshot();
        if loaded.fell_back {
            notices.record(
                NoticeKind::SnapshotFallback,
                format!("上次保存的试卷部分损坏，丢弃了 {} 道题", loaded.dropped_questions),
            );
        }
        let restored = if loaded.snapshot.final_question_list.is_empty() {
            None
        } else {
            Some(loaded)
        };
        let preferences = snapshots.load_preferences();

        let provider = Arc::new(LlmContentProvider::new(&config));
        let session = ComposerSession::new(provider, preferences.to_filter(), Arc::clone(&notices))
            .with_reorder_activation(config.reorder_activation_px);

        Ok(Self {
            config,
            notices,
            snapshots,
            restored,
            session,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        self.prepare_questions().await?;
        self.compose().await?;

        self.session
            .apply_theme(&self.config.theme_name)
            .context("无法应用主题")?;

        let artifact = self.export().await?;
        let path = artifact
            .write_to(Path::new(&self.config.export_dir))
            .await
            .context("无法写入导出文件")?;
        info!("📄 已写入: {}", path.display());

        self.session.settle().await;
        if self.config.save_snapshot {
            self.save()?;
        }

        print_final_stats(&self.session, &artifact, &self.notices);
        Ok(())
    }

    /// 恢复快照或准备题库
    async fn prepare_questions(&mut self) -> Result<()> {
        if let Some(loaded) = self.restored.take() {
            let restored = self.session.restore(loaded.snapshot);
            info!("📂 从快照恢复 {} 道题到终稿", restored);
            return Ok(());
        }

        info!("\n📁 正在扫描手工录入的题目...");
        let drafts = load_question_folder(&self.config.question_folder).await?;
        let seeded = self.session.seed_from_drafts(drafts);
        info!("✓ 手工录入 {} 道题", seeded);

        let wanted = self.config.bank_size.saturating_sub(seeded);
        if wanted > 0 {
            if let Err(e) = self.session.generate_bank(wanted).await {
                // 手工题目仍可组卷
                warn!("⚠️ 内容服务生成题库失败: {}", e);
            }
        }
        Ok(())
    }

    /// 组卷：终稿已有题目时不再追加
    async fn compose(&mut self) -> Result<()> {
        if !self.session.pipeline().final_order().is_empty() {
            return Ok(());
        }

        match &self.config.template_file {
            Some(file) => {
                let template = load_template(Path::new(file)).await?;
                let allocation = self.session.compose_from_template(&template);
                info!(
                    "📐 模板分配完成: {} 个大题, {} 道题",
                    allocation.sections.len(),
                    allocation.questions().len()
                );
            }
            None => {
                let moved = self.session.compose_from_visible_bank();
                info!("📝 {} 道题已放入终稿", moved);
            }
        }

        if self.session.pipeline().final_order().is_empty() {
            anyhow::bail!("终稿中没有题目，无法导出");
        }
        Ok(())
    }

    async fn export(&self) -> Result<ExportArtifact> {
        let pages = self.session.render();
        let artifact = export_in_browser(
            &self.config,
            Arc::clone(&self.notices),
            &pages,
            self.session.metadata(),
        )
        .await
        .context("导出 PDF 失败")?;
        Ok(artifact)
    }

    fn save(&self) -> Result<()> {
        self.snapshots
            .save_snapshot(self.session.metadata(), &self.session.final_questions())
            .context("无法保存快照")?;
        self.snapshots
            .save_preferences(&Preferences::from_filter(self.session.pipeline().filter()))
            .context("无法保存偏好设置")?;
        Ok(())
    }
}

// ========== 日志辅助函数 ==========

fn print_final_stats(
    session: &ComposerSession<LlmContentProvider>,
    artifact: &ExportArtifact,
    notices: &NoticeWriter,
) {
    let pipeline = session.pipeline();
    info!("\n{}", "=".repeat(60));
    info!("📊 组卷统计");
    info!("{}", "=".repeat(60));
    info!("📝 终稿: {} 道题, 共 {} 分", pipeline.final_order().len(), pipeline.final_marks());
    info!("📚 题库剩余: {} 道 (缺口 {})", pipeline.bank().len(), pipeline.shortfall());
    info!("🗂️ 备选: {} 道", pipeline.staging().len());
    info!("📄 PDF: {} 页", artifact.page_count);
    let recorded = notices.notices();
    if !recorded.is_empty() {
        info!("⚠️ 提示: {} 条，详见提示日志", recorded.len());
    }
    info!("{}", "=".repeat(60));
}
