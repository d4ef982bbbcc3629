// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print dispatcher: measure, open the printer, rasterize each page, submit.
//
// The printer is opened before any rasterization so an absent printer costs
// no raster work. The job is submitted only after every page has been
// emitted; any failure before that drops the open job unprinted.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument};

use studentreports_core::error::Result;
use studentreports_core::traits::PrintDispatcher;
use studentreports_core::types::{JobId, PaperGeometry, PrintReceipt, PrinterTarget, RenderedDocument};
use studentreports_document::PdfInspector;

use crate::page_plan::PagePlan;
use crate::rasterizer::PageRasterizer;
use crate::spooler::{EmittedPage, Spooler};

/// Job title shown in the printer queue unless overridden.
pub const DEFAULT_JOB_NAME: &str = "Students Report";

/// Rasterizes each page to the roll width and spools the result.
pub struct RasterPrintDispatcher<R, S> {
    rasterizer: R,
    spooler: S,
    paper: PaperGeometry,
    dpi: u32,
    job_name: String,
}

impl<R: PageRasterizer, S: Spooler> RasterPrintDispatcher<R, S> {
    pub fn new(rasterizer: R, spooler: S, paper: PaperGeometry, dpi: u32) -> Self {
        Self {
            rasterizer,
            spooler,
            paper,
            dpi,
            job_name: DEFAULT_JOB_NAME.into(),
        }
    }

    pub fn with_job_name(mut self, job_name: impl Into<String>) -> Self {
        self.job_name = job_name.into();
        self
    }

    /// Parse the document and lay out its pages on the roll.
    fn plan(&self, document: &RenderedDocument) -> Result<PagePlan> {
        let sizes = PdfInspector::from_bytes(document.bytes())?.page_sizes()?;
        PagePlan::new(sizes, self.paper.printable_width_pt(), self.dpi)
    }
}

#[async_trait]
impl<R: PageRasterizer, S: Spooler> PrintDispatcher for RasterPrintDispatcher<R, S> {
    #[instrument(skip_all, fields(printer = %printer, digest = %document.digest()))]
    async fn print(
        &self,
        document: RenderedDocument,
        printer: &PrinterTarget,
    ) -> Result<PrintReceipt> {
        let job_id = JobId::new();
        let plan = self.plan(&document)?;
        let page_count = plan.page_count();
        debug!(%job_id, page_count, "document loaded");

        let mut job = self.spooler.open(printer, &self.paper).await?;

        let mut emitted = 0;
        for step in plan {
            let raster = self.rasterizer.rasterize(document.bytes(), &step).await?;
            job.emit_page(EmittedPage {
                index: step.index,
                raster,
                has_more_pages: step.has_more_pages,
            })?;
            emitted += 1;
        }

        let spooler_job_id = job.submit(&self.job_name).await?;
        let receipt = PrintReceipt {
            job_id,
            spooler_job_id,
            printer: printer.clone(),
            pages: emitted,
            document_digest: document.digest().to_string(),
            submitted_at: Utc::now(),
        };
        info!(
            %job_id,
            spooler_job_id,
            pages = receipt.pages,
            "print job submitted"
        );
        Ok(receipt)
    }
}
