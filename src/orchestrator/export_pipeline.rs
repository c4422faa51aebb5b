//! 导出流水线 - 编排层
//!
//! ## 职责
//!
//! 把渲染好的页面逐页截图，再组装成一个 PDF。
//!
//! ## 核心规则
//!
//! 1. **严格串行**：一次只截一页，峰值内存只有一张位图
//! 2. **部分成功**：某页失败只跳过该页，记录日志和提示后继续
//! 3. **顺序不变**：输出顺序 = 输入顺序去掉失败页
//! 4. **全部失败**：返回 `ExportError::NoPagesCaptured`，没有产物

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use crate::browser;
use crate::config::Config;
use crate::error::{AppResult, ExportError};
use crate::infrastructure::{ChromeRasterizer, PageRasterizer, PdfAssembler};
use crate::models::paper::PaperMetadata;
use crate::render::html::RenderedPage;
use crate::services::notice_writer::{NoticeKind, NoticeWriter};
use crate::utils::logging;

/// 导出进度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportProgress {
    pub exporting: bool,
    pub done: usize,
    pub total: usize,
}

/// 导出产物
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// 输出页对应的输入页码
    pub page_sources: Vec<usize>,
    /// 失败跳过的输入页码
    pub skipped: Vec<usize>,
}

impl ExportArtifact {
    /// 写入目录，返回完整路径
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        let write_err = |source| ExportError::WriteFailed {
            path: path.display().to_string(),
            source,
        };
        tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
        tokio::fs::write(&path, &self.bytes).await.map_err(write_err)?;
        Ok(path)
    }
}

/// 文件名：`{科目}_{标题}.pdf`，各部分只保留字母数字（含中文）
pub fn artifact_file_name(subject: &str, title: &str) -> String {
    let clean = |s: &str| s.chars().filter(|c| c.is_alphanumeric()).collect::<String>();
    let parts: Vec<String> = [clean(subject), clean(title)]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        "exam_paper.pdf".to_string()
    } else {
        format!("{}.pdf", parts.join("_"))
    }
}

pub struct ExportPipeline<R> {
    rasterizer: R,
    notices: Arc<NoticeWriter>,
    progress: watch::Sender<ExportProgress>,
    scale: f64,
}

impl<R: PageRasterizer> ExportPipeline<R> {
    pub fn new(rasterizer: R, notices: Arc<NoticeWriter>, scale: f64) -> Self {
        let (progress, _rx) = watch::channel(ExportProgress::default());
        Self {
            rasterizer,
            notices,
            progress,
            scale,
        }
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<ExportProgress> {
        self.progress.subscribe()
    }

    pub fn is_exporting(&self) -> bool {
        self.progress.borrow().exporting
    }

    /// 导出整份文档
    pub async fn export_document(
        &mut self,
        pages: &[RenderedPage],
        metadata: &PaperMetadata,
    ) -> Result<ExportArtifact, ExportError> {
        let total = pages.len();
        logging::log_export_start(total, self.scale);
        self.progress.send_replace(ExportProgress {
            exporting: true,
            done: 0,
            total,
        });

        let mut assembler = PdfAssembler::new(&metadata.title);
        let mut skipped = Vec::new();

        for (index, page) in pages.iter().enumerate() {
            info!("🖨️ [{}/{}] 正在截图第 {} 页", index + 1, total, page.page_number);

            let result = match self.rasterizer.rasterize(page).await {
                Ok(bitmap) => assembler.add_page(page.page_number, &bitmap),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                error!("❌ 第 {} 页导出失败，已跳过: {}", page.page_number, e);
                self.notices.record(
                    NoticeKind::PageSkipped,
                    format!("第 {} 页导出失败，已跳过: {}", page.page_number, e),
                );
                skipped.push(page.page_number);
            }

            self.progress.send_modify(|p| p.done = index + 1);
        }

        let page_sources = assembler.page_sources().to_vec();
        let finished = assembler.finish(total);
        self.progress.send_replace(ExportProgress {
            exporting: false,
            done: total,
            total,
        });

        let bytes = finished?;
        let file_name = artifact_file_name(&metadata.subject, &metadata.title);
        logging::print_export_stats(page_sources.len(), &skipped, &file_name);

        Ok(ExportArtifact {
            file_name,
            bytes,
            page_count: page_sources.len(),
            page_sources,
            skipped,
        })
    }
}

/// 打开浏览器并导出整份文档
///
/// 浏览器在导出结束后随返回值一起释放。
pub async fn export_in_browser(
    config: &Config,
    notices: Arc<NoticeWriter>,
    pages: &[RenderedPage],
    metadata: &PaperMetadata,
) -> AppResult<ExportArtifact> {
    let (_browser, page) = browser::open_browser(config).await?;
    let rasterizer = ChromeRasterizer::new(page, config.device_scale_factor)?;
    let mut pipeline = ExportPipeline::new(rasterizer, notices, config.device_scale_factor);
    Ok(pipeline.export_document(pages, metadata).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::future::Future;

    /// 指定页码失败的截图器
    struct FlakyRasterizer {
        fail_pages: Vec<usize>,
        calls: Vec<usize>,
    }

    impl PageRasterizer for FlakyRasterizer {
        fn rasterize(&mut self, page: &RenderedPage) -> impl Future<Output = Result<RgbImage, ExportError>> {
            self.calls.push(page.page_number);
            let fail = self.fail_pages.contains(&page.page_number);
            let page_number = page.page_number;
            async move {
                if fail {
                    Err(ExportError::RasterizeFailed {
                        page: page_number,
                        message: "渲染超时".to_string(),
                    })
                } else {
                    Ok(RgbImage::from_pixel(21, 30, image::Rgb([page_number as u8, 0, 0])))
                }
            }
        }
    }

    fn pages(n: usize) -> Vec<RenderedPage> {
        (1..=n)
            .map(|i| RenderedPage {
                page_number: i,
                html: format!("<p>{}</p>", i),
            })
            .collect()
    }

    fn pipeline(fail_pages: Vec<usize>) -> (ExportPipeline<FlakyRasterizer>, Arc<NoticeWriter>) {
        let notices = Arc::new(NoticeWriter::in_memory());
        let rasterizer = FlakyRasterizer {
            fail_pages,
            calls: Vec::new(),
        };
        (ExportPipeline::new(rasterizer, Arc::clone(&notices), 2.0), notices)
    }

    #[tokio::test]
    async fn test_failed_middle_page_is_skipped() {
        let (mut pipeline, notices) = pipeline(vec![2]);
        let metadata = PaperMetadata {
            title: "期中 考试!".into(),
            subject: "Math".into(),
            ..Default::default()
        };
        let artifact = pipeline.export_document(&pages(3), &metadata).await.unwrap();

        assert_eq!(artifact.page_count, 2);
        assert_eq!(artifact.page_sources, vec![1, 3]);
        assert_eq!(artifact.skipped, vec![2]);
        assert_eq!(artifact.file_name, "Math_期中考试.pdf");
        assert!(artifact.bytes.starts_with(b"%PDF"));
        assert_eq!(notices.count_of(NoticeKind::PageSkipped), 1);
        assert!(!pipeline.is_exporting());
    }

    #[tokio::test]
    async fn test_output_order_is_input_order_minus_failures() {
        let (mut pipeline, _) = pipeline(vec![1, 4, 5]);
        let artifact = pipeline.export_document(&pages(6), &PaperMetadata::default()).await.unwrap();
        assert_eq!(artifact.page_sources, vec![2, 3, 6]);
        assert_eq!(pipeline.rasterizer.calls, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_all_pages_failing_yields_no_artifact() {
        let (mut pipeline, notices) = pipeline(vec![1, 2]);
        let progress = pipeline.subscribe_progress();
        let err = pipeline.export_document(&pages(2), &PaperMetadata::default()).await.unwrap_err();

        assert!(matches!(err, ExportError::NoPagesCaptured { attempted: 2 }));
        assert_eq!(notices.count_of(NoticeKind::PageSkipped), 2);
        assert_eq!(*progress.borrow(), ExportProgress { exporting: false, done: 2, total: 2 });
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(artifact_file_name("", ""), "exam_paper.pdf");
        assert_eq!(artifact_file_name("  ", "Unit 3: Forces"), "Unit3Forces.pdf");
        assert_eq!(artifact_file_name("物理", "未命名试卷"), "物理_未命名试卷.pdf");
    }
}
