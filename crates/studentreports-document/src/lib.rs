// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// studentreports-document: report templates and the PDF side of the pipeline.
//
// Provides the JSON report-definition model, the renderer that lays student
// rows out on an 80 mm continuous page, page-geometry inspection of existing
// PDFs, and assembly of rasterized pages into a print-ready PDF.

pub mod pdf;
pub mod render;
pub mod template;

pub use pdf::reader::{PageSize, PdfInspector};
pub use pdf::writer::{RasterPage, RasterPdfWriter};
pub use render::PdfReportRenderer;
pub use template::ReportTemplate;
