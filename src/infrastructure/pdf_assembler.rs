//! PDF 组装 - 基础设施层
//!
//! 第一张位图到达时才创建文档（作为第 1 页），之后每张位图先加页再贴图。
//! 每页固定 210×297mm，位图铺满整页。

use image::RgbImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument,
    PdfDocumentReference, Px,
};
use tracing::debug;

use crate::error::ExportError;
use crate::models::paper::{PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

const LAYER_NAME: &str = "Page";

pub struct PdfAssembler {
    title: String,
    doc: Option<PdfDocumentReference>,
    /// 每个输出页对应的输入页码
    page_sources: Vec<usize>,
}

impl PdfAssembler {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            doc: None,
            page_sources: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_sources.len()
    }

    pub fn page_sources(&self) -> &[usize] {
        &self.page_sources
    }

    /// 追加一页
    pub fn add_page(&mut self, source_page: usize, bitmap: &RgbImage) -> Result<(), ExportError> {
        let (width, height) = bitmap.dimensions();
        if width == 0 || height == 0 {
            return Err(ExportError::AssemblyFailed(format!(
                "第 {} 页位图为空",
                source_page
            )));
        }

        let page_w = Mm(PAGE_WIDTH_MM as f32);
        let page_h = Mm(PAGE_HEIGHT_MM as f32);
        let layer = match &self.doc {
            None => {
                let (doc, page, layer) = PdfDocument::new(&self.title, page_w, page_h, LAYER_NAME);
                let layer = doc.get_page(page).get_layer(layer);
                self.doc = Some(doc);
                layer
            }
            Some(doc) => {
                let (page, layer) = doc.add_page(page_w, page_h, LAYER_NAME);
                doc.get_page(page).get_layer(layer)
            }
        };

        let image = Image::from(ImageXObject {
            width: Px(width as usize),
            height: Px(height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: bitmap.as_raw().clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // 按宽度铺满整页
        let dpi = width as f32 / (PAGE_WIDTH_MM as f32 / 25.4);
        image.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm(0.0)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );

        self.page_sources.push(source_page);
        debug!("已加入第 {} 页 (输出第 {} 页)", source_page, self.page_sources.len());
        Ok(())
    }

    /// 输出 PDF 字节；一页都没有时没有产物
    pub fn finish(self, attempted: usize) -> Result<Vec<u8>, ExportError> {
        let doc = self
            .doc
            .ok_or(ExportError::NoPagesCaptured { attempted })?;
        doc.save_to_bytes()
            .map_err(|e| ExportError::AssemblyFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_assembler_has_no_artifact() {
        let err = PdfAssembler::new("t").finish(3).unwrap_err();
        assert!(matches!(err, ExportError::NoPagesCaptured { attempted: 3 }));
    }

    #[test]
    fn test_pages_keep_input_order() {
        let mut assembler = PdfAssembler::new("t");
        let bitmap = RgbImage::from_pixel(40, 56, image::Rgb([255, 255, 255]));
        assembler.add_page(1, &bitmap).unwrap();
        assembler.add_page(3, &bitmap).unwrap();
        assert_eq!(assembler.page_sources(), &[1, 3]);

        let bytes = assembler.finish(3).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_bitmap_is_rejected() {
        let mut assembler = PdfAssembler::new("t");
        assert!(assembler.add_page(1, &RgbImage::new(0, 0)).is_err());
        assert_eq!(assembler.page_count(), 0);
    }
}
