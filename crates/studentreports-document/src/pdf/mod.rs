// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page geometry of existing PDFs and raster-page assembly.

pub mod reader;
pub mod writer;

pub use reader::{PageSize, PdfInspector};
pub use writer::{RasterPage, RasterPdfWriter};
