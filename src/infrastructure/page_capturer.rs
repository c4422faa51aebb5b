//! 页面截图 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"把一页 HTML 变成位图"的能力

use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use image::RgbImage;
use regex::Regex;
use std::future::Future;
use tracing::debug;

use crate::config::MIN_DEVICE_SCALE_FACTOR;
use crate::error::ExportError;
use crate::render::html::RenderedPage;

/// A4 在 96dpi 下的 CSS 像素尺寸
pub const PAGE_WIDTH_PX: u32 = 794;
pub const PAGE_HEIGHT_PX: u32 = 1123;

/// 栅格化接口
pub trait PageRasterizer {
    fn rasterize(&mut self, page: &RenderedPage) -> impl Future<Output = Result<RgbImage, ExportError>>;
}

/// 去掉外部字体资源，离线截图时它们只会拖慢甚至卡住加载
pub struct FontStripper {
    patterns: Vec<Regex>,
}

impl FontStripper {
    pub fn new() -> Result<Self, regex::Error> {
        let patterns = vec![
            Regex::new(r#"(?i)<link\b[^>]*href\s*=\s*["']?https?://[^>]*>"#)?,
            Regex::new(r#"(?i)@import\s+(?:url\()?\s*["']?https?://[^;]*;"#)?,
            Regex::new(r#"(?i)@font-face\s*\{[^}]*url\(\s*["']?https?://[^}]*\}"#)?,
        ];
        Ok(Self { patterns })
    }

    pub fn strip(&self, html: &str) -> String {
        self.patterns
            .iter()
            .fold(html.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
    }
}

/// 基于 Chrome 的截图器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 不认识题目 / 试卷，只认识 HTML
pub struct ChromeRasterizer {
    page: Page,
    scale: f64,
    stripper: FontStripper,
}

impl ChromeRasterizer {
    pub fn new(page: Page, scale: f64) -> Result<Self, ExportError> {
        let stripper = FontStripper::new().map_err(|e| ExportError::RasterizeFailed {
            page: 0,
            message: format!("字体过滤规则无效: {}", e),
        })?;
        Ok(Self {
            page,
            scale: scale.max(MIN_DEVICE_SCALE_FACTOR),
            stripper,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    async fn capture(&self, html: &str) -> Result<Vec<u8>, chromiumoxide::error::CdpError> {
        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                PAGE_WIDTH_PX as i64,
                PAGE_HEIGHT_PX as i64,
                self.scale,
                false,
            ))
            .await?;
        self.page.set_content(html).await?;
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .omit_background(false)
                    .build(),
            )
            .await
    }
}

impl PageRasterizer for ChromeRasterizer {
    fn rasterize(&mut self, page: &RenderedPage) -> impl Future<Output = Result<RgbImage, ExportError>> {
        let page_number = page.page_number;
        let html = self.stripper.strip(&page.html);
        async move {
            let png = self
                .capture(&html)
                .await
                .map_err(|e| ExportError::RasterizeFailed {
                    page: page_number,
                    message: e.to_string(),
                })?;
            let bitmap = image::load_from_memory(&png)
                .map_err(|e| ExportError::RasterizeFailed {
                    page: page_number,
                    message: format!("截图解码失败: {}", e),
                })?
                .to_rgb8();
            debug!("第 {} 页截图: {}x{}", page_number, bitmap.width(), bitmap.height());
            Ok(bitmap)
        }
    }
}
