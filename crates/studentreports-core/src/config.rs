// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{PaperGeometry, PrinterTarget};

/// Everything the report pipeline needs to know about its surroundings,
/// passed in at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Root that the template and logo paths are resolved against.
    pub web_root: PathBuf,
    /// Report template, relative to `web_root`.
    pub template_path: PathBuf,
    /// Logo image, relative to `web_root`.
    pub logo_path: PathBuf,
    /// Value of the `ReportName` parameter.
    pub report_title: String,
    /// Name of the template's tabular data slot.
    pub dataset_name: String,
    /// Logical printer the report is sent to.
    pub printer_name: String,
    /// Physical roll width in millimetres.
    pub paper_width_mm: u32,
    /// Rasterization resolution for every printed page.
    pub raster_dpi: u32,
}

impl ReportConfig {
    /// Absolute (web-root-relative) path of the report template.
    pub fn resolved_template_path(&self) -> PathBuf {
        self.web_root.join(&self.template_path)
    }

    /// Absolute (web-root-relative) path of the logo image.
    pub fn resolved_logo_path(&self) -> PathBuf {
        self.web_root.join(&self.logo_path)
    }

    pub fn printer(&self) -> PrinterTarget {
        PrinterTarget::new(self.printer_name.clone())
    }

    pub fn paper(&self) -> PaperGeometry {
        PaperGeometry::roll(self.paper_width_mm)
    }

    /// Replace the web root, keeping the relative paths.
    pub fn with_web_root(mut self, web_root: impl AsRef<Path>) -> Self {
        self.web_root = web_root.as_ref().to_path_buf();
        self
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            web_root: PathBuf::from("wwwroot"),
            template_path: PathBuf::from("Reports/Student.report.json"),
            logo_path: PathBuf::from("imgs/Logo.png"),
            report_title: "Students Report".into(),
            dataset_name: "studentDataSet".into(),
            printer_name: "Bullzip_PDF_Printer".into(),
            paper_width_mm: 80,
            raster_dpi: 300,
        }
    }
}
