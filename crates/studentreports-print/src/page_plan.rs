// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page plan: the per-page geometry of a print job, computed up front.
//
// Iterating a plan walks the pages in ascending order. Each step says how
// large the page prints (scaled uniformly to the roll width), how many
// pixels its raster needs, and whether further pages follow.

use studentreports_core::error::{ReportError, Result};
use studentreports_core::types::POINTS_PER_INCH;
use studentreports_document::PageSize;

/// One page of the plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageStep {
    /// 0-based page index.
    pub index: usize,
    pub native: PageSize,
    /// Uniform factor from native size to printed size.
    pub scale: f32,
    pub target_width_pt: f32,
    pub target_height_pt: f32,
    pub width_px: u32,
    pub height_px: u32,
    /// `false` only on the last page.
    pub has_more_pages: bool,
}

/// Iterator over the pages of a document, scaled to a fixed print width.
#[derive(Debug, Clone)]
pub struct PagePlan {
    pages: Vec<PageSize>,
    target_width_pt: f32,
    dpi: u32,
    next: usize,
}

impl PagePlan {
    /// A plan for `pages`, fitting each to `target_width_pt` at `dpi`.
    pub fn new(pages: Vec<PageSize>, target_width_pt: f32, dpi: u32) -> Result<Self> {
        if pages.is_empty() {
            return Err(ReportError::DocumentCorrupt("document has no pages".into()));
        }
        if !(target_width_pt.is_finite() && target_width_pt > 0.0) || dpi == 0 {
            return Err(ReportError::RasterizeFailed(format!(
                "invalid print area {target_width_pt} pt at {dpi} dpi"
            )));
        }
        if let Some((index, page)) = pages
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.width_pt > 0.0 && p.height_pt > 0.0))
        {
            return Err(ReportError::DocumentCorrupt(format!(
                "page {index} has degenerate size {}x{}",
                page.width_pt, page.height_pt
            )));
        }
        Ok(Self {
            pages,
            target_width_pt,
            dpi,
            next: 0,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Geometry of page `index` without advancing the iterator.
    pub fn step(&self, index: usize) -> Option<PageStep> {
        let native = *self.pages.get(index)?;
        let scale = self.target_width_pt / native.width_pt;
        let target_height_pt = native.height_pt * scale;
        Some(PageStep {
            index,
            native,
            scale,
            target_width_pt: self.target_width_pt,
            target_height_pt,
            width_px: to_pixels(self.target_width_pt, self.dpi),
            height_px: to_pixels(target_height_pt, self.dpi),
            has_more_pages: index + 1 < self.pages.len(),
        })
    }
}

impl Iterator for PagePlan {
    type Item = PageStep;

    fn next(&mut self) -> Option<PageStep> {
        let step = self.step(self.next)?;
        self.next += 1;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.pages.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PagePlan {}

fn to_pixels(length_pt: f32, dpi: u32) -> u32 {
    ((length_pt / POINTS_PER_INCH * dpi as f32).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 80 mm in points.
    const ROLL_PT: f32 = 226.771_65;

    fn size(width_pt: f32, height_pt: f32) -> PageSize {
        PageSize {
            width_pt,
            height_pt,
        }
    }

    #[test]
    fn one_step_per_page_and_only_the_last_is_final() {
        let plan = PagePlan::new(
            vec![size(612.0, 792.0), size(612.0, 792.0), size(226.77, 1400.0)],
            ROLL_PT,
            300,
        )
        .expect("plan");
        assert_eq!(plan.len(), 3);

        let steps: Vec<PageStep> = plan.collect();
        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps.iter().map(|s| s.index).collect::<Vec<_>>(),
            [0, 1, 2]
        );
        assert_eq!(
            steps.iter().map(|s| s.has_more_pages).collect::<Vec<_>>(),
            [true, true, false]
        );
    }

    #[test]
    fn single_page_has_no_more_pages() {
        let steps: Vec<_> = PagePlan::new(vec![size(100.0, 100.0)], ROLL_PT, 300)
            .expect("plan")
            .collect();
        assert_eq!(steps.len(), 1);
        assert!(!steps[0].has_more_pages);
    }

    #[test]
    fn aspect_ratio_is_preserved() {
        let (w, h) = (612.0_f32, 792.0_f32);
        let step = PagePlan::new(vec![size(w, h)], ROLL_PT, 300)
            .expect("plan")
            .step(0)
            .expect("page 0");
        let expected = h * (ROLL_PT / w);
        assert!((step.target_height_pt - expected).abs() < 1e-3);
        assert!((step.target_width_pt - ROLL_PT).abs() < 1e-6);

        let pixel_ratio = step.height_px as f32 / step.width_px as f32;
        assert!((pixel_ratio - h / w).abs() < 0.002);
    }

    #[test]
    fn pixel_size_follows_dpi() {
        let step = PagePlan::new(vec![size(ROLL_PT, ROLL_PT * 2.0)], ROLL_PT, 300)
            .expect("plan")
            .step(0)
            .expect("page 0");
        // 80 mm at 300 dpi.
        assert_eq!(step.width_px, 945);
        assert_eq!(step.height_px, 1890);
        assert!((step.scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn size_hint_shrinks_as_pages_are_taken() {
        let mut plan =
            PagePlan::new(vec![size(10.0, 10.0); 4], ROLL_PT, 72).expect("plan");
        assert_eq!(plan.size_hint(), (4, Some(4)));
        plan.next();
        plan.next();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.page_count(), 4);
    }

    #[test]
    fn empty_document_is_corrupt() {
        let err = PagePlan::new(Vec::new(), ROLL_PT, 300).expect_err("no pages");
        assert!(matches!(err, ReportError::DocumentCorrupt(_)));
    }

    #[test]
    fn degenerate_page_is_corrupt() {
        let err = PagePlan::new(vec![size(100.0, 0.0)], ROLL_PT, 300).expect_err("zero height");
        assert!(matches!(err, ReportError::DocumentCorrupt(_)));
    }
}
