// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spooler seam.
//
// A job is opened against a named printer first, receives its pages one at a
// time, and is submitted only after the last page arrives. Dropping a job
// without submitting it prints nothing.

use async_trait::async_trait;

use studentreports_core::error::{ReportError, Result};
use studentreports_core::types::{PaperGeometry, PrinterTarget};
use studentreports_document::RasterPage;

/// One physical page handed to a spool job.
#[derive(Debug, Clone)]
pub struct EmittedPage {
    pub index: usize,
    pub raster: RasterPage,
    pub has_more_pages: bool,
}

/// Opens print jobs on named printers.
#[async_trait]
pub trait Spooler: Send + Sync {
    /// Fails with `PrinterUnavailable` if the printer cannot take a job now.
    async fn open(&self, printer: &PrinterTarget, paper: &PaperGeometry)
    -> Result<Box<dyn SpoolJob>>;
}

/// An open, not yet submitted print job.
#[async_trait]
pub trait SpoolJob: Send {
    fn emit_page(&mut self, page: EmittedPage) -> Result<()>;

    /// Hand the job to the printer. Returns the spooler's job number.
    async fn submit(self: Box<Self>, job_name: &str) -> Result<i32>;
}

/// Page bookkeeping shared by spool job implementations.
///
/// Enforces ascending, gapless indices and that nothing follows the page
/// marked final.
#[derive(Debug, Default)]
pub struct PageSequence {
    pages: Vec<EmittedPage>,
}

impl PageSequence {
    pub fn push(&mut self, page: EmittedPage) -> Result<()> {
        if self.is_complete() {
            return Err(ReportError::RasterizeFailed(format!(
                "page {} emitted after the final page",
                page.index
            )));
        }
        if page.index != self.pages.len() {
            return Err(ReportError::RasterizeFailed(format!(
                "page {} emitted out of order (expected {})",
                page.index,
                self.pages.len()
            )));
        }
        self.pages.push(page);
        Ok(())
    }

    /// True once the page marked final has been received.
    pub fn is_complete(&self) -> bool {
        self.pages.last().is_some_and(|p| !p.has_more_pages)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Tallest page, in points.
    pub fn max_height_pt(&self) -> f32 {
        self.pages
            .iter()
            .map(|p| p.raster.height_pt)
            .fold(0.0, f32::max)
    }

    /// The received pages, once the final page is in.
    pub fn finish(self) -> Result<Vec<RasterPage>> {
        if !self.is_complete() {
            return Err(ReportError::RasterizeFailed(format!(
                "job submitted after {} pages without a final page",
                self.pages.len()
            )));
        }
        Ok(self.pages.into_iter().map(|p| p.raster).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage};

    fn page(index: usize, height_pt: f32, has_more_pages: bool) -> EmittedPage {
        EmittedPage {
            index,
            raster: RasterPage::new(
                DynamicImage::ImageLuma8(GrayImage::new(4, 4)),
                226.77,
                height_pt,
            ),
            has_more_pages,
        }
    }

    #[test]
    fn accepts_an_ordered_sequence() {
        let mut seq = PageSequence::default();
        seq.push(page(0, 100.0, true)).expect("first");
        assert!(!seq.is_complete());
        seq.push(page(1, 300.0, false)).expect("last");
        assert!(seq.is_complete());
        assert_eq!(seq.max_height_pt(), 300.0);
        assert_eq!(seq.finish().expect("complete").len(), 2);
    }

    #[test]
    fn rejects_gaps_and_pages_after_the_last() {
        let mut seq = PageSequence::default();
        assert!(seq.push(page(1, 10.0, true)).is_err());
        seq.push(page(0, 10.0, false)).expect("only page");
        assert!(seq.push(page(1, 10.0, false)).is_err());
    }

    #[test]
    fn finish_requires_a_final_page() {
        let mut seq = PageSequence::default();
        seq.push(page(0, 10.0, true)).expect("first");
        assert!(seq.finish().is_err());
        assert!(PageSequence::default().finish().is_err());
    }
}
