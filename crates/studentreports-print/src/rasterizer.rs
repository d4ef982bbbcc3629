// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization through Poppler's `pdftoppm`.
//
// The PDF is streamed to the child on stdin and a single PNG is read back from
// stdout, so nothing touches disk. One child process per page; it is killed
// if the future is dropped.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use studentreports_core::error::{ReportError, Result};
use studentreports_document::RasterPage;

use crate::page_plan::PageStep;

/// Produces the raster of one page at the size a [`PageStep`] asks for.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(&self, pdf: &[u8], step: &PageStep) -> Result<RasterPage>;
}

/// Rasterizer backed by the `pdftoppm` executable.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    program: PathBuf,
}

impl PopplerRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for rendering one page to PNG on stdout.
    fn arguments(step: &PageStep, dpi: u32) -> Vec<String> {
        // pdftoppm page numbers are 1-based.
        let page = (step.index + 1).to_string();
        vec![
            "-png".into(),
            "-r".into(),
            dpi.to_string(),
            "-f".into(),
            page.clone(),
            "-l".into(),
            page,
            "-singlefile".into(),
            "-scale-to-x".into(),
            step.width_px.to_string(),
            "-scale-to-y".into(),
            step.height_px.to_string(),
            "-".into(),
        ]
    }

    /// Resolution implied by a step's pixel width and printed width.
    fn effective_dpi(step: &PageStep) -> u32 {
        let inches = step.target_width_pt / studentreports_core::types::POINTS_PER_INCH;
        ((step.width_px as f32 / inches).round() as u32).max(1)
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

#[async_trait]
impl PageRasterizer for PopplerRasterizer {
    #[instrument(skip(self, pdf, step), fields(page = step.index, width_px = step.width_px, height_px = step.height_px))]
    async fn rasterize(&self, pdf: &[u8], step: &PageStep) -> Result<RasterPage> {
        let args = Self::arguments(step, Self::effective_dpi(step));
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ReportError::RasterizeFailed(format!(
                    "{} not found; install poppler-utils",
                    self.program.display()
                )),
                _ => ReportError::RasterizeFailed(format!("spawn {}: {e}", self.program.display())),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReportError::RasterizeFailed("child stdin unavailable".into()))?;
        let input = pdf.to_vec();
        let feed = async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        };

        // Feed stdin while draining stdout so neither pipe can fill up.
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| ReportError::RasterizeFailed(format!("wait: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReportError::RasterizeFailed(format!(
                "page {}: pdftoppm exited with {}: {}",
                step.index,
                output.status,
                stderr.trim()
            )));
        }
        // A broken pipe after a successful exit only means the child stopped
        // reading early; anything else is a real write failure.
        if let Err(e) = fed
            && e.kind() != io::ErrorKind::BrokenPipe
        {
            return Err(ReportError::RasterizeFailed(format!("write stdin: {e}")));
        }

        debug!(png_bytes = output.stdout.len(), "page rasterized");
        RasterPage::decode(&output.stdout, step.target_width_pt, step.target_height_pt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_plan::PagePlan;
    use studentreports_document::PageSize;

    fn first_step() -> PageStep {
        PagePlan::new(
            vec![
                PageSize {
                    width_pt: 612.0,
                    height_pt: 792.0,
                },
                PageSize {
                    width_pt: 612.0,
                    height_pt: 792.0,
                },
            ],
            226.771_65,
            300,
        )
        .expect("plan")
        .nth(1)
        .expect("second page")
    }

    #[test]
    fn arguments_select_one_page_and_fit_bounds() {
        let step = first_step();
        let args = PopplerRasterizer::arguments(&step, 300);
        let joined = args.join(" ");
        assert!(joined.starts_with("-png -r 300 -f 2 -l 2 -singlefile"));
        assert!(joined.contains(&format!("-scale-to-x {}", step.width_px)));
        assert!(joined.contains(&format!("-scale-to-y {}", step.height_px)));
        assert_eq!(args.last().map(String::as_str), Some("-"));
    }

    #[test]
    fn effective_dpi_matches_plan() {
        assert_eq!(PopplerRasterizer::effective_dpi(&first_step()), 300);
    }

    #[tokio::test]
    async fn missing_executable_is_rasterize_failed() {
        let rasterizer = PopplerRasterizer::new("/nonexistent/bin/pdftoppm");
        let err = rasterizer
            .rasterize(b"%PDF-1.5", &first_step())
            .await
            .expect_err("no such program");
        assert!(matches!(err, ReportError::RasterizeFailed(_)));
    }
}
