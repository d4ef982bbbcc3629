// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report renderer: binds student rows to a template and lays out a receipt
// PDF with `printpdf` 0.8.
//
// Pages are as wide as the paper roll with zero margins. Text uses the
// template's TrueType fonts, or built-in Helvetica when it names none.
// A value the active face cannot show fails the render.

pub mod font;
pub mod layout;

use std::path::Path;

use printpdf::{
    Line, LinePoint, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt,
    RawImage, RawImageData, RawImageFormat, XObjectId, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use studentreports_core::error::{ReportError, Result};
use studentreports_core::traits::ReportRenderer;
use studentreports_core::types::{DataSource, RenderedDocument, ReportParameters, StudentRecord};

use crate::template::{self, ReportTemplate};
use font::{Faces, TextFace};
use layout::{
    Measure, Metrics, PageSlice, aligned_x, column_bounds, fit_text, mm_to_pt, pt_to_mm,
    single_line,
};

/// Lays out student rows on a receipt-width PDF.
#[derive(Debug, Clone)]
pub struct PdfReportRenderer {
    paper_width_mm: f32,
    /// Whether `File:` image parameters may be read from disk.
    external_images: bool,
}

impl PdfReportRenderer {
    pub fn new(paper_width_mm: f32) -> Self {
        Self {
            paper_width_mm,
            external_images: true,
        }
    }

    /// Allow or forbid reading image parameters from the filesystem.
    pub fn with_external_images(mut self, enabled: bool) -> Self {
        self.external_images = enabled;
        self
    }

    /// Render from an already-loaded template.
    #[instrument(skip_all, fields(template = %template.name, rows = data.rows.len()))]
    pub fn render_template(
        &self,
        template: &ReportTemplate,
        data: &DataSource,
        parameters: &ReportParameters,
    ) -> Result<RenderedDocument> {
        template.bind(data, parameters)?;

        let page_width_pt = mm_to_pt(self.paper_width_mm);
        let metrics = Metrics::new(template, page_width_pt);
        let fixed_height_pt = template.page_height_mm.map(mm_to_pt);
        let slices = layout::paginate(&metrics, data.rows.len(), fixed_height_pt)?;

        let title = template
            .header
            .title_parameter
            .as_ref()
            .and_then(|name| parameters.get(name))
            .cloned();
        let mut doc = PdfDocument::new(title.as_deref().unwrap_or(&template.name));
        let faces = Faces::load(&mut doc, &template.fonts)?;
        check_coverage(template, data, title.as_deref(), &faces)?;

        let logo = template
            .header
            .logo_parameter
            .as_ref()
            .and_then(|name| parameters.get(name))
            .and_then(|value| self.load_logo(&mut doc, value));

        let columns = column_bounds(template, &metrics);
        let pages: Vec<PdfPage> = slices
            .iter()
            .map(|slice| {
                let mut page = PageWriter::new(&metrics, &faces, slice);
                if slice.first {
                    page.preamble(logo.as_ref(), title.as_deref());
                }
                page.table_header(template, &columns);
                for record in &data.rows[slice.rows.clone()] {
                    page.row(template, &columns, record);
                }
                page.finish(self.paper_width_mm)
            })
            .collect();

        let page_count = pages.len();
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if bytes.is_empty() {
            return Err(ReportError::RenderFailed("PDF serialisation produced no bytes".into()));
        }
        debug!(warnings = warnings.len(), "PDF serialised");

        let rendered = RenderedDocument::new(bytes, page_count);
        info!(
            pages = rendered.page_count(),
            bytes = rendered.len(),
            digest = %rendered.digest(),
            "report rendered"
        );
        Ok(rendered)
    }

    /// Resolve and decode a logo reference. Any failure leaves a blank space.
    fn load_logo(&self, doc: &mut PdfDocument, reference: &str) -> Option<PlacedImage> {
        if !self.external_images {
            warn!(reference, "external images disabled; leaving logo blank");
            return None;
        }
        let Some(path) = template::file_reference(reference) else {
            warn!(reference, "unsupported image reference; leaving logo blank");
            return None;
        };
        match decode_image(&path) {
            Ok(raw) => {
                let (width_px, height_px) = (raw.width, raw.height);
                let id = doc.add_image(&raw);
                Some(PlacedImage {
                    id,
                    width_px,
                    height_px,
                })
            }
            Err(reason) => {
                warn!(path = %path.display(), %reason, "logo unavailable; leaving blank");
                None
            }
        }
    }
}

impl ReportRenderer for PdfReportRenderer {
    fn render(
        &self,
        template_path: &Path,
        data: DataSource,
        parameters: &ReportParameters,
    ) -> Result<RenderedDocument> {
        let template = ReportTemplate::load(template_path)?;
        self.render_template(&template, &data, parameters)
    }
}

fn decode_image(path: &Path) -> std::result::Result<RawImage, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("read: {e}"))?;
    let decoded = ::image::load_from_memory(&bytes).map_err(|e| format!("decode: {e}"))?;
    let (width, height) = (decoded.width() as usize, decoded.height() as usize);
    if width == 0 || height == 0 {
        return Err("image has no pixels".into());
    }
    Ok(RawImage {
        pixels: RawImageData::U8(decoded.to_rgb8().into_raw()),
        width,
        height,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    })
}

/// Fail on the first title, heading or cell the chosen faces cannot show.
fn check_coverage(
    template: &ReportTemplate,
    data: &DataSource,
    title: Option<&str>,
    faces: &Faces,
) -> Result<()> {
    let uncovered = |face: &TextFace, text: &str, place: String| match face.first_uncovered(text) {
        Some(c) => Err(ReportError::RenderFailed(format!(
            "{place}: U+{:04X} '{c}' has no glyph in {}; name a font that covers it under `fonts`",
            c as u32,
            face.name()
        ))),
        None => Ok(()),
    };

    if let Some(title) = title {
        uncovered(&faces.bold, &single_line(title), "title".into())?;
    }
    for column in &template.columns {
        uncovered(
            &faces.bold,
            &single_line(&column.header),
            format!("heading of column `{}`", column.field),
        )?;
    }
    for (index, record) in data.rows.iter().enumerate() {
        for column in &template.columns {
            uncovered(
                &faces.regular,
                &single_line(&record.display(&column.field)),
                format!("row {}, column `{}`", index + 1, column.field),
            )?;
        }
    }
    Ok(())
}

struct PlacedImage {
    id: XObjectId,
    width_px: usize,
    height_px: usize,
}

/// Accumulates the drawing operations of one page, top to bottom.
struct PageWriter<'a> {
    metrics: &'a Metrics,
    faces: &'a Faces,
    height_pt: f32,
    /// Distance from the top edge to the next free line.
    cursor_pt: f32,
    ops: Vec<Op>,
}

impl<'a> PageWriter<'a> {
    fn new(metrics: &'a Metrics, faces: &'a Faces, slice: &PageSlice) -> Self {
        Self {
            metrics,
            faces,
            height_pt: slice.height_pt,
            cursor_pt: metrics.padding_pt,
            ops: Vec::new(),
        }
    }

    fn preamble(&mut self, logo: Option<&PlacedImage>, title: Option<&str>) {
        let m = self.metrics;
        if m.logo_pt > 0.0 {
            if let Some(image) = logo {
                self.image(image, m.logo_pt);
            }
            self.cursor_pt += m.logo_pt;
        }
        if m.title_line_pt > 0.0 {
            let faces = self.faces;
            let face = &faces.bold;
            let title = fit_text(
                &single_line(title.unwrap_or_default()),
                m.printable_width_pt(),
                m.title_font_pt,
                face,
            );
            let width = face.width_pt(&title, m.title_font_pt);
            let x = ((m.page_width_pt - width) / 2.0).max(m.padding_pt);
            let baseline = self.cursor_pt + m.title_line_pt * 0.7;
            self.text(x, baseline, &title, m.title_font_pt, face);
            self.cursor_pt += m.title_line_pt;
        }
        self.cursor_pt += m.gap_pt;
    }

    /// Centre an image horizontally, scaled to `box_height_pt`.
    fn image(&mut self, image: &PlacedImage, box_height_pt: f32) {
        let m = self.metrics;
        // At 72 DPI one pixel is one point.
        let scale = (box_height_pt / image.height_px as f32)
            .min(m.printable_width_pt() / image.width_px as f32);
        let width = image.width_px as f32 * scale;
        let height = image.height_px as f32 * scale;
        let x = (m.page_width_pt - width) / 2.0;
        let top = self.cursor_pt + (box_height_pt - height) / 2.0;
        self.ops.push(Op::UseXobject {
            id: image.id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(x)),
                translate_y: Some(Pt(self.height_pt - top - height)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(72.0),
                rotate: None,
            },
        });
    }

    fn table_header(&mut self, template: &ReportTemplate, columns: &[(f32, f32)]) {
        let m = self.metrics;
        let cells = template.columns.iter().map(|c| (c.header.clone(), c.align));
        let faces = self.faces;
        self.cells(cells, columns, &faces.bold);

        let rule_y = self.height_pt - (self.cursor_pt + m.rule_pt / 2.0);
        self.ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
        self.ops.push(Op::DrawLine {
            line: Line {
                points: vec![
                    LinePoint {
                        p: Point {
                            x: Pt(m.padding_pt),
                            y: Pt(rule_y),
                        },
                        bezier: false,
                    },
                    LinePoint {
                        p: Point {
                            x: Pt(m.page_width_pt - m.padding_pt),
                            y: Pt(rule_y),
                        },
                        bezier: false,
                    },
                ],
                is_closed: false,
            },
        });
        self.cursor_pt += m.rule_pt;
    }

    fn row(&mut self, template: &ReportTemplate, columns: &[(f32, f32)], record: &StudentRecord) {
        let cells = template
            .columns
            .iter()
            .map(|c| (record.display(&c.field), c.align));
        let faces = self.faces;
        self.cells(cells, columns, &faces.regular);
    }

    fn cells(
        &mut self,
        cells: impl Iterator<Item = (String, template::Alignment)>,
        columns: &[(f32, f32)],
        face: &TextFace,
    ) {
        let m = self.metrics;
        let baseline = self.cursor_pt + m.line_pt * 0.75;
        for ((value, align), &(x, width)) in cells.zip(columns) {
            let inner = (width - 2.0 * layout::CELL_PADDING_PT).max(0.0);
            let text = fit_text(&single_line(&value), inner, m.font_pt, face);
            if text.is_empty() {
                continue;
            }
            let text_x = aligned_x(align, x, width, face.width_pt(&text, m.font_pt));
            self.text(text_x, baseline, &text, m.font_pt, face);
        }
        self.cursor_pt += m.line_pt;
    }

    /// Write one run of text with its baseline `baseline_pt` below the top.
    fn text(&mut self, x: f32, baseline_pt: f32, text: &str, size: f32, face: &TextFace) {
        self.ops.extend([
            Op::StartTextSection,
            Op::SetTextCursor {
                pos: Point {
                    x: Pt(x),
                    y: Pt(self.height_pt - baseline_pt),
                },
            },
        ]);
        self.ops.extend(face.write_ops(text, size));
        self.ops.push(Op::EndTextSection);
    }

    fn finish(self, page_width_mm: f32) -> PdfPage {
        PdfPage::new(Mm(page_width_mm), Mm(pt_to_mm(self.height_pt)), self.ops)
    }
}
