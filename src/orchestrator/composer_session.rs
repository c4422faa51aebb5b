//! 组卷会话 - 编排层
//!
//! ## 职责
//!
//! 持有一次组卷的全部状态（题池、试卷信息、版式、封面），
//! 是唯一可以修改题池的任务。
//!
//! ## 补题
//!
//! `select` 同步完成题池转移后，把补题请求 spawn 到运行时上；
//! 结果通过 mpsc 回到会话，只有在 `poll_completions` / `settle`
//! 时才会真正写入题库。

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_REORDER_ACTIVATION_PX;
use crate::error::{ConfigError, ProviderError};
use crate::models::cover::{
    default_cover, subject_line, INSTRUCTIONS_ELEMENT, SUBJECT_ELEMENT, TITLE_ELEMENT,
};
use crate::models::filter::FilterCriteria;
use crate::models::paper::{PageDescriptor, PaperMetadata};
use crate::models::question::{IdAllocator, QuestionDraft, QuestionEntity, QuestionId};
use crate::models::snapshot::PaperSnapshot;
use crate::models::template::{ExamTemplate, SectionAllocation};
use crate::models::theme::{PaperLayout, ThemeCatalog};
use crate::render::html::{render_document, RenderedPage};
use crate::render::paginate::paginate;
use crate::services::content_provider::ContentProvider;
use crate::services::notice_writer::{NoticeKind, NoticeWriter};
use crate::services::replenisher::Replenisher;
use crate::services::section_allocator::SectionAllocator;
use crate::workflow::positioning::{ContainerRect, CoverCanvas};
use crate::workflow::reorder_drag::DragOutcome;
use crate::workflow::selection::{ReplenishmentOutcome, SelectionPipeline};
use crate::workflow::views::{apply_outcome, ControlListView, PreviewListView};

/// 封面编辑区的默认像素尺寸（A4 @96dpi）
const COVER_CONTAINER: ContainerRect = ContainerRect {
    width_px: 794.0,
    height_px: 1123.0,
};

pub struct ComposerSession<P> {
    pipeline: SelectionPipeline,
    replenisher: Replenisher<P>,
    completions_tx: mpsc::UnboundedSender<ReplenishmentOutcome>,
    completions_rx: mpsc::UnboundedReceiver<ReplenishmentOutcome>,
    notices: Arc<NoticeWriter>,
    metadata: PaperMetadata,
    layout: PaperLayout,
    cover: CoverCanvas,
    allocation: Option<SectionAllocation>,
    generating: bool,
    reorder_activation_px: f64,
}

impl<P: ContentProvider> ComposerSession<P> {
    pub fn new(provider: Arc<P>, filter: FilterCriteria, notices: Arc<NoticeWriter>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let metadata = PaperMetadata::default();
        Self {
            pipeline: SelectionPipeline::new(filter),
            replenisher: Replenisher::new(provider, IdAllocator::new()),
            completions_tx,
            completions_rx,
            notices,
            cover: CoverCanvas::new(default_cover(&metadata), COVER_CONTAINER),
            metadata,
            layout: PaperLayout::default(),
            allocation: None,
            generating: false,
            reorder_activation_px: DEFAULT_REORDER_ACTIVATION_PX,
        }
    }

    /// 列表视图的拖拽激活距离
    pub fn with_reorder_activation(mut self, activation_px: f64) -> Self {
        self.reorder_activation_px = activation_px;
        self
    }

    // ========== 状态访问 ==========

    pub fn pipeline(&self) -> &SelectionPipeline {
        &self.pipeline
    }

    pub fn metadata(&self) -> &PaperMetadata {
        &self.metadata
    }

    /// 修改试卷信息，封面上对应的文字随之更新
    ///
    /// 封面只在会话创建时生成一次，用户的移动、缩放、增删都保留。
    pub fn set_metadata(&mut self, metadata: PaperMetadata) {
        self.cover.sync_content(TITLE_ELEMENT, metadata.title.as_str());
        self.cover.sync_content(SUBJECT_ELEMENT, subject_line(&metadata));
        self.cover
            .sync_content(INSTRUCTIONS_ELEMENT, metadata.instructions.as_str());
        self.metadata = metadata;
    }

    pub fn layout(&self) -> &PaperLayout {
        &self.layout
    }

    pub fn cover(&self) -> &CoverCanvas {
        &self.cover
    }

    pub fn cover_mut(&mut self) -> &mut CoverCanvas {
        &mut self.cover
    }

    pub fn allocation(&self) -> Option<&SectionAllocation> {
        self.allocation.as_ref()
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn notices(&self) -> &Arc<NoticeWriter> {
        &self.notices
    }

    /// 整体应用主题，只改版式
    pub fn apply_theme(&mut self, name: &str) -> Result<(), ConfigError> {
        let theme = ThemeCatalog::get(name).ok_or_else(|| ConfigError::UnknownTheme {
            name: name.to_string(),
        })?;
        self.layout.apply_theme(theme);
        info!("🎨 已应用主题: {}", theme.name);
        Ok(())
    }

    pub fn set_filter(&mut self, filter: FilterCriteria) {
        self.pipeline.set_filter(filter);
    }

    // ========== 题库来源 ==========

    /// 手工录入的题目加入题库，由引擎分配 ID
    pub fn seed_from_drafts(&mut self, drafts: Vec<QuestionDraft>) -> usize {
        let ids = self.replenisher.ids().clone();
        self.pipeline
            .seed_bank(drafts.into_iter().map(|d| d.into_entity(ids.next_id())))
    }

    /// 从快照恢复终稿和试卷信息
    pub fn restore(&mut self, snapshot: PaperSnapshot) -> usize {
        self.replenisher
            .ids()
            .reserve_past(snapshot.final_question_list.iter().map(|q| &q.id));
        self.set_metadata(snapshot.metadata);
        self.pipeline.restore_final(snapshot.final_question_list)
    }

    /// 向内容服务要一批题目放进题库
    ///
    /// 试卷还没有标题时采用服务建议的标题。
    pub async fn generate_bank(&mut self, count: usize) -> Result<usize, ProviderError> {
        self.generating = true;
        let result = self
            .replenisher
            .fetch(self.pipeline.filter().clone(), count, self.pipeline.all_ids())
            .await;
        self.generating = false;

        let batch = result?;
        if let Some(title) = batch.suggested_title {
            if self.metadata.title == PaperMetadata::default().title {
                info!("📝 采用建议标题: {}", title);
                let mut metadata = self.metadata.clone();
                metadata.title = title;
                self.set_metadata(metadata);
            }
        }
        let added = self.pipeline.seed_bank(batch.questions);
        info!("📚 题库新增 {} 道题", added);
        Ok(added)
    }

    // ========== 题池操作 ==========

    /// 题库 → 备选，并在后台补一道题
    pub fn select(&mut self, id: &QuestionId) -> bool {
        let Some(request) = self.pipeline.add_to_staging(id) else {
            return false;
        };
        debug!("发出补题请求 #{}", request.ticket);

        let replenisher = self.replenisher.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let outcome = replenisher.run(request).await;
            // 会话已结束时直接丢弃
            let _ = tx.send(outcome);
        });
        true
    }

    pub fn move_to_final(&mut self, id: &QuestionId) -> bool {
        self.pipeline.move_to_final(id)
    }

    pub fn move_all_staging_to_final(&mut self) -> usize {
        self.pipeline.move_all_staging_to_final()
    }

    pub fn remove_from_staging(&mut self, id: &QuestionId) -> bool {
        self.pipeline.remove_from_staging(id)
    }

    pub fn remove_from_final(&mut self, id: &QuestionId) -> bool {
        self.pipeline.remove_from_final(id)
    }

    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        self.pipeline.reorder_final(from, to)
    }

    /// 应用任一列表视图产出的拖拽结果
    pub fn apply_drag(&mut self, outcome: DragOutcome) -> bool {
        apply_outcome(&mut self.pipeline, outcome)
    }

    pub fn edit_question(&mut self, id: &QuestionId, edit: impl FnOnce(&mut QuestionEntity)) -> bool {
        self.pipeline.edit_question(id, edit)
    }

    pub fn control_view(&self) -> ControlListView {
        ControlListView::new(self.pipeline.subscribe_final(), self.reorder_activation_px)
    }

    pub fn preview_view(&self) -> PreviewListView {
        PreviewListView::new(
            self.pipeline.subscribe_final(),
            self.layout.clone(),
            self.reorder_activation_px,
        )
    }

    // ========== 补题结果 ==========

    fn apply_completion(&mut self, outcome: ReplenishmentOutcome) -> usize {
        if let ReplenishmentOutcome::Failed { ticket, reason } = &outcome {
            self.notices.record(
                NoticeKind::ReplenishmentShortfall,
                format!("补题 #{} 失败，题库少一题: {}", ticket, reason),
            );
        }
        self.pipeline.apply_replenishment(outcome)
    }

    /// 应用已经到达的补题结果，不等待
    pub fn poll_completions(&mut self) -> usize {
        let mut added = 0;
        while let Ok(outcome) = self.completions_rx.try_recv() {
            added += self.apply_completion(outcome);
        }
        added
    }

    /// 等待所有在途补题完成
    pub async fn settle(&mut self) -> usize {
        let mut added = self.poll_completions();
        while self.pipeline.in_flight_replenishments() > 0 {
            match self.completions_rx.recv().await {
                Some(outcome) => added += self.apply_completion(outcome),
                None => break,
            }
        }
        added
    }

    // ========== 组卷 ==========

    /// 没有模板时：当前可见题库全部选入并移入终稿
    pub fn compose_from_visible_bank(&mut self) -> usize {
        let ids: Vec<QuestionId> = self
            .pipeline
            .visible_bank()
            .into_iter()
            .map(|q| q.id.clone())
            .collect();
        for id in &ids {
            self.select(id);
        }
        self.move_all_staging_to_final()
    }

    /// 按模板分配：候选为可见题库和备选，分配到的题目依次移入终稿
    pub fn compose_from_template(&mut self, template: &ExamTemplate) -> &SectionAllocation {
        let pool: Vec<QuestionEntity> = self
            .pipeline
            .visible_bank()
            .into_iter()
            .chain(self.pipeline.staging().iter())
            .cloned()
            .collect();
        let allocation = SectionAllocator::allocate(template, &pool);

        for warning in &allocation.warnings {
            self.notices.record(NoticeKind::AllocationShortage, warning.clone());
        }
        for question in allocation.sections.iter().flat_map(|s| s.questions.iter()) {
            self.select(&question.id);
            self.move_to_final(&question.id);
        }
        if !allocation.complete {
            warn!("⚠️ 模板 {} 未能凑齐全部题目", template.name);
        }

        self.allocation.insert(allocation)
    }

    // ========== 输出 ==========

    /// 封面 + 正文页
    pub fn paginate(&self) -> Vec<PageDescriptor> {
        paginate(
            self.pipeline.final_order().items(),
            &self.layout,
            self.allocation.as_ref(),
            true,
        )
    }

    pub fn render(&self) -> Vec<RenderedPage> {
        render_document(
            &self.paginate(),
            &self.layout,
            &self.metadata.title,
            self.cover.elements(),
        )
    }

    pub fn final_questions(&self) -> Vec<QuestionEntity> {
        self.pipeline.final_order().questions()
    }
}
