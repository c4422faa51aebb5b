use exam_composer::error::{ExportError, ProviderError};
use exam_composer::infrastructure::PageRasterizer;
use exam_composer::models::{
    CoverElement, CoverElementKind, ElementId, Geometry, PaperMetadata, QuestionDraft, QuestionId,
    QuestionType,
};
use exam_composer::orchestrator::{ComposerSession, ExportPipeline};
use exam_composer::render::RenderedPage;
use exam_composer::services::{
    ContentProvider, ContentRequest, ContentResponse, MemoryStore, NoticeKind, NoticeWriter,
    SnapshotService,
};
use exam_composer::workflow::{
    ContainerRect, CoverCanvas, CoverEvent, OrderView, PointerPos, SizePx,
};
use image::RgbImage;
use std::future::Future;
use std::sync::Arc;

/// 总是返回一道固定题目的内容服务
struct EchoProvider;

impl ContentProvider for EchoProvider {
    fn generate(
        &self,
        request: ContentRequest,
    ) -> impl Future<Output = Result<ContentResponse, ProviderError>> + Send {
        async move {
            let drafts = (0..request.desired_count)
                .map(|i| draft(&format!("补充题 {}", i)))
                .collect();
            Ok(ContentResponse {
                drafts,
                suggested_title: None,
            })
        }
    }
}

/// 指定页码失败的截图器
struct FlakyRasterizer {
    fail_page: usize,
}

impl PageRasterizer for FlakyRasterizer {
    fn rasterize(&mut self, page: &RenderedPage) -> impl Future<Output = Result<RgbImage, ExportError>> {
        let page_number = page.page_number;
        let fail = page_number == self.fail_page;
        async move {
            if fail {
                Err(ExportError::RasterizeFailed {
                    page: page_number,
                    message: "截图超时".to_string(),
                })
            } else {
                Ok(RgbImage::new(21, 30))
            }
        }
    }
}

fn draft(body: &str) -> QuestionDraft {
    QuestionDraft {
        body: body.to_string(),
        marks: 2,
        difficulty: Default::default(),
        topic: "力学".to_string(),
        question_type: QuestionType::ShortAnswer,
        payload: None,
        answer_lines: None,
        unit: None,
    }
}

fn session_with(bodies: &[&str]) -> ComposerSession<EchoProvider> {
    let mut session = ComposerSession::new(
        Arc::new(EchoProvider),
        Default::default(),
        Arc::new(NoticeWriter::in_memory()),
    );
    session.seed_from_drafts(bodies.iter().map(|b| draft(b)).collect());
    session
}

fn ids_of(bank: &[exam_composer::QuestionEntity]) -> Vec<QuestionId> {
    bank.iter().map(|q| q.id.clone()).collect()
}

#[tokio::test]
async fn test_selecting_from_bank_stages_and_replenishes() {
    let mut session = session_with(&["Q1", "Q2", "Q3"]);
    let bank = ids_of(session.pipeline().bank());

    assert!(session.select(&bank[1]));
    assert_eq!(ids_of(session.pipeline().bank()), vec![bank[0].clone(), bank[2].clone()]);
    assert_eq!(ids_of(session.pipeline().staging()), vec![bank[1].clone()]);

    session.settle().await;
    let after = session.pipeline().bank();
    assert_eq!(after.len(), 3);
    assert!(!bank.contains(&after[2].id), "补充的题目必须有新的 ID");
}

#[tokio::test]
async fn test_move_all_staging_keeps_staging_order() {
    let mut session = session_with(&["Q1", "Q2", "Q3", "Q4", "Q5"]);
    let bank = ids_of(session.pipeline().bank());
    session.select(&bank[1]);
    session.select(&bank[4]);

    assert_eq!(session.move_all_staging_to_final(), 2);
    let final_ids: Vec<QuestionId> = session
        .final_questions()
        .into_iter()
        .map(|q| q.id)
        .collect();
    assert_eq!(final_ids, vec![bank[1].clone(), bank[4].clone()]);
    assert!(session.pipeline().staging().is_empty());
}

#[tokio::test]
async fn test_drag_in_preview_renumbers_both_views() {
    let mut session = session_with(&["甲", "乙", "丙", "丁"]);
    session.compose_from_visible_bank();
    let before = ids_of(&session.final_questions());

    let control = session.control_view();
    let mut preview = session.preview_view();
    preview.pointer_down(3, PointerPos::new(0.0, 120.0));
    preview.pointer_move(PointerPos::new(0.0, 1.0), 0);
    let outcome = preview.pointer_up();
    assert!(session.apply_drag(outcome));

    let expected = vec![before[3].clone(), before[0].clone(), before[1].clone(), before[2].clone()];
    assert_eq!(control.ids(), expected);
    assert_eq!(preview.ids(), expected);
    let numbers: Vec<u32> = control.snapshot().iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[test]
fn test_cover_drag_is_clamped_inside_page() {
    let element = CoverElement::new(ElementId(1), CoverElementKind::Text, Geometry::at(95.0, 95.0), "标题");
    let mut canvas = CoverCanvas::new(vec![element], ContainerRect { width_px: 800.0, height_px: 1000.0 });

    canvas.handle(
        ElementId(1),
        CoverEvent::PointerDown {
            pos: PointerPos::new(0.0, 0.0),
            handle: None,
            measured: SizePx { width: 100.0, height: 40.0 },
        },
    );
    canvas.handle(ElementId(1), CoverEvent::PointerMove { pos: PointerPos::new(400.0, 500.0) });
    canvas.handle(ElementId(1), CoverEvent::PointerUp);

    let geometry = canvas.element(ElementId(1)).unwrap().geometry;
    assert_eq!((geometry.x, geometry.y), (99.0, 99.0));
    assert_eq!(canvas.global_listener_count(), 0);
}

#[tokio::test]
async fn test_export_skips_failed_page_and_keeps_order() {
    let mut session = session_with(&["Q1", "Q2", "Q3"]);
    session.compose_from_visible_bank();
    let pages = session.render();
    assert!(pages.len() >= 2);

    let notices = Arc::new(NoticeWriter::in_memory());
    let mut pipeline = ExportPipeline::new(FlakyRasterizer { fail_page: 2 }, Arc::clone(&notices), 2.0);
    let artifact = pipeline
        .export_document(&pages, session.metadata())
        .await
        .unwrap();

    let expected: Vec<usize> = pages
        .iter()
        .map(|p| p.page_number)
        .filter(|&n| n != 2)
        .collect();
    assert_eq!(artifact.page_sources, expected);
    assert_eq!(artifact.page_count, pages.len() - 1);
    assert_eq!(artifact.skipped, vec![2]);
    assert_eq!(notices.count_of(NoticeKind::PageSkipped), 1);
}

#[tokio::test]
async fn test_snapshot_restores_final_list_without_id_collisions() {
    let mut session = session_with(&["Q1", "Q2"]);
    session.compose_from_visible_bank();
    session.settle().await;
    let saved = session.final_questions();

    let snapshots = SnapshotService::new(MemoryStore::new());
    let metadata = PaperMetadata {
        title: "期末测验".to_string(),
        ..Default::default()
    };
    snapshots.save_snapshot(&metadata, &saved).unwrap();

    let loaded = snapshots.load_snapshot();
    assert!(!loaded.fell_back);

    let mut restored = ComposerSession::new(
        Arc::new(EchoProvider),
        Default::default(),
        Arc::new(NoticeWriter::in_memory()),
    );
    assert_eq!(restored.restore(loaded.snapshot), 2);
    assert_eq!(restored.final_questions(), saved);
    assert_eq!(restored.metadata().title, "期末测验");

    restored.seed_from_drafts(vec![draft("新题")]);
    let fresh = &restored.pipeline().bank()[0].id;
    assert!(!saved.iter().any(|q| &q.id == fresh));
}
