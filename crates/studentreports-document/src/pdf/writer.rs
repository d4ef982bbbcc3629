// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster PDF writer: wraps already-rasterized pages in a PDF the spooler
// will print without rescaling, using `printpdf` 0.8.
//
// Each page is exactly as large as its raster's physical bounds and the
// image covers it edge to edge.

use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, instrument};

use studentreports_core::error::{ReportError, Result};

use crate::render::layout::pt_to_mm;

/// One rasterized page and the physical size it must print at.
#[derive(Debug, Clone)]
pub struct RasterPage {
    pub image: DynamicImage,
    pub width_pt: f32,
    pub height_pt: f32,
}

impl RasterPage {
    pub fn new(image: DynamicImage, width_pt: f32, height_pt: f32) -> Self {
        Self {
            image,
            width_pt,
            height_pt,
        }
    }

    /// Decode a PNG (or any format `image` recognises) into a page.
    pub fn decode(encoded: &[u8], width_pt: f32, height_pt: f32) -> Result<Self> {
        let image = image::load_from_memory(encoded)
            .map_err(|e| ReportError::RasterizeFailed(format!("decode raster: {e}")))?;
        Ok(Self::new(image, width_pt, height_pt))
    }

    pub fn width_px(&self) -> u32 {
        self.image.width()
    }

    pub fn height_px(&self) -> u32 {
        self.image.height()
    }
}

/// Builds the print-ready PDF sent to the spooler.
pub struct RasterPdfWriter {
    title: String,
}

impl RasterPdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Serialise `pages` in order, one PDF page each.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn write(&self, pages: &[RasterPage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(ReportError::RasterizeFailed("no pages to assemble".into()));
        }

        let mut doc = PdfDocument::new(&self.title);
        let mut pdf_pages = Vec::with_capacity(pages.len());

        for (index, page) in pages.iter().enumerate() {
            let (width_px, height_px) = (page.width_px() as usize, page.height_px() as usize);
            if width_px == 0 || height_px == 0 {
                return Err(ReportError::RasterizeFailed(format!(
                    "page {index} raster is empty"
                )));
            }

            let raw = RawImage {
                pixels: RawImageData::U8(page.image.to_rgb8().into_raw()),
                width: width_px,
                height: height_px,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let id = doc.add_image(&raw);

            // At 72 DPI one pixel is one point; scale each axis onto the page.
            let ops = vec![Op::UseXobject {
                id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(page.width_pt / width_px as f32),
                    scale_y: Some(page.height_pt / height_px as f32),
                    dpi: Some(72.0),
                    rotate: None,
                },
            }];
            pdf_pages.push(PdfPage::new(
                Mm(pt_to_mm(page.width_pt)),
                Mm(pt_to_mm(page.height_pt)),
                ops,
            ));
        }

        doc.with_pages(pdf_pages);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = output.len(), warnings = warnings.len(), "raster PDF assembled");
        Ok(output)
    }
}
