// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request-scoped report pipeline: fetch → render → print.
//
// Each stage runs to completion before the next starts. The blocking stages
// (SQLite and layout) run on the blocking pool; the first error ends the
// request.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task;
use tracing::{info, instrument};

use studentreports_core::config::ReportConfig;
use studentreports_core::error::{ReportError, Result};
use studentreports_core::traits::{PrintDispatcher, PrinterDirectory, RecordSource, ReportRenderer};
use studentreports_core::types::{DataSource, PrintReceipt, ReportParameters};
use studentreports_data::SqliteRecordSource;
use studentreports_document::PdfReportRenderer;
use studentreports_print::{IppSpooler, PopplerRasterizer, RasterPrintDispatcher};

use crate::config::Settings;

/// Name of the template parameter carrying the display title.
pub const PARAM_REPORT_NAME: &str = "ReportName";
/// Name of the template parameter carrying the logo reference.
pub const PARAM_LOGO: &str = "Logo";

/// The assembled pipeline, shared by every request.
pub struct ReportPipeline {
    config: ReportConfig,
    records: Arc<dyn RecordSource>,
    renderer: Arc<dyn ReportRenderer>,
    dispatcher: Arc<dyn PrintDispatcher>,
    printers: Arc<dyn PrinterDirectory>,
}

impl ReportPipeline {
    pub fn new(
        config: ReportConfig,
        records: Arc<dyn RecordSource>,
        renderer: Arc<dyn ReportRenderer>,
        dispatcher: Arc<dyn PrintDispatcher>,
        printers: Arc<dyn PrinterDirectory>,
    ) -> Self {
        Self {
            config,
            records,
            renderer,
            dispatcher,
            printers,
        }
    }

    /// Wire the production components from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = settings.report.clone();
        let paper = config.paper();
        let spooler = IppSpooler::new(&settings.printer.cups_uri)?;
        let rasterizer = PopplerRasterizer::new(settings.printer.pdftoppm_path.clone());
        let dispatcher = RasterPrintDispatcher::new(rasterizer, spooler.clone(), paper, config.raster_dpi)
            .with_job_name(config.report_title.clone());

        Ok(Self::new(
            config.clone(),
            Arc::new(SqliteRecordSource::new(settings.database.path.clone())),
            Arc::new(PdfReportRenderer::new(config.paper_width_mm as f32)),
            Arc::new(dispatcher),
            Arc::new(spooler),
        ))
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// The two parameters the student template declares.
    pub fn parameters(&self) -> ReportParameters {
        let logo = absolute(&self.config.resolved_logo_path());
        ReportParameters::from([
            (PARAM_REPORT_NAME.to_string(), self.config.report_title.clone()),
            (PARAM_LOGO.to_string(), format!("File:{}", logo.display())),
        ])
    }

    /// Fetch every student, render the report and print it.
    #[instrument(skip(self), fields(printer = %self.config.printer_name))]
    pub async fn print_report(&self) -> Result<PrintReceipt> {
        let records = Arc::clone(&self.records);
        let rows = blocking(move || records.fetch_all()).await?;
        info!(rows = rows.len(), "student rows fetched");

        let renderer = Arc::clone(&self.renderer);
        let template_path = self.config.resolved_template_path();
        let data = DataSource::new(self.config.dataset_name.clone(), rows);
        let parameters = self.parameters();
        let document =
            blocking(move || renderer.render(&template_path, data, &parameters)).await?;

        let receipt = self.dispatcher.print(document, &self.config.printer()).await?;
        info!(
            job_id = %receipt.job_id,
            spooler_job_id = receipt.spooler_job_id,
            pages = receipt.pages,
            digest = %receipt.document_digest,
            "student report printed"
        );
        Ok(receipt)
    }

    /// Names of the printers installed on the host.
    pub async fn installed_printers(&self) -> Result<Vec<String>> {
        self.printers.installed_printers().await
    }
}

/// Run a blocking stage on the blocking pool and wait for it.
async fn blocking<T, F>(stage: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(stage)
        .await
        .map_err(|e| ReportError::Io(io::Error::other(format!("blocking stage failed: {e}"))))?
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::fakes::*;
    use super::*;

    #[test]
    fn parameters_carry_title_and_absolute_logo_reference() {
        let parts = Parts::new(
            FakeRecords::with_students(0),
            FakeRenderer::default(),
            FakePrinters::new(&[]),
        );
        let params = parts.pipeline().parameters();
        assert_eq!(params.len(), 2);
        assert_eq!(params[PARAM_REPORT_NAME], "Students Report");
        assert_eq!(params[PARAM_LOGO], "File:/srv/reports/imgs/Logo.png");
    }

    #[tokio::test]
    async fn prints_all_rows_through_the_template() {
        let parts = Parts::new(
            FakeRecords::with_students(3),
            FakeRenderer::default(),
            FakePrinters::new(&["Bullzip_PDF_Printer"]),
        );
        let receipt = parts.pipeline().print_report().await.expect("print");

        assert_eq!(receipt.printer.name(), "Bullzip_PDF_Printer");
        let seen = parts.renderer.seen.lock().expect("seen");
        let (template, dataset, rows, _) = &seen[0];
        assert_eq!(template, Path::new("/srv/reports/Reports/Student.report.json"));
        assert_eq!(dataset, "studentDataSet");
        assert_eq!(*rows, 3);
    }

    #[tokio::test]
    async fn empty_record_set_still_prints() {
        let parts = Parts::new(
            FakeRecords::with_students(0),
            FakeRenderer::default(),
            FakePrinters::new(&["Bullzip_PDF_Printer"]),
        );
        parts.pipeline().print_report().await.expect("print");
        assert_eq!(parts.printers.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn storage_failure_stops_before_rendering() {
        let parts = Parts::new(
            FakeRecords {
                rows: Vec::new(),
                fail: true,
            },
            FakeRenderer::default(),
            FakePrinters::new(&["Bullzip_PDF_Printer"]),
        );
        let err = parts.pipeline().print_report().await.expect_err("storage down");
        assert!(matches!(err, ReportError::StorageUnavailable(_)));
        assert_eq!(parts.renderer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(parts.printers.calls.load(Ordering::SeqCst), 0);
    }
}
