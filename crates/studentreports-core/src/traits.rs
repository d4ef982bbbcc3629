// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline seams.
//
// Each stage of fetch → render → print sits behind a trait so the request
// handler can be assembled from real components in production and from
// fakes in tests.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    DataSource, PrintReceipt, PrinterTarget, RenderedDocument, ReportParameters, StudentRecord,
};

/// Supplies the student rows to print, in storage order.
///
/// Blocking; callers on an async runtime run it on a blocking thread.
pub trait RecordSource: Send + Sync {
    fn fetch_all(&self) -> Result<Vec<StudentRecord>>;
}

/// Binds rows and parameters to a report template and lays out a PDF.
///
/// Blocking and free of side effects: nothing is written to disk and
/// nothing is printed.
pub trait ReportRenderer: Send + Sync {
    fn render(
        &self,
        template_path: &Path,
        data: DataSource,
        parameters: &ReportParameters,
    ) -> Result<RenderedDocument>;
}

/// Sends a rendered document to a printer, consuming it.
#[async_trait]
pub trait PrintDispatcher: Send + Sync {
    async fn print(
        &self,
        document: RenderedDocument,
        printer: &PrinterTarget,
    ) -> Result<PrintReceipt>;
}

/// Lists the printers installed on the host.
#[async_trait]
pub trait PrinterDirectory: Send + Sync {
    async fn installed_printers(&self) -> Result<Vec<String>>;
}
