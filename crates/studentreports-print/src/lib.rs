// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// studentreports-print: turns a rendered PDF into a receipt print job.
//
// Pages are measured, scaled to the roll width, rasterized one at a time and
// handed to the spooler, which submits a single job once every page is in.

pub mod dispatcher;
pub mod ipp_spooler;
pub mod page_plan;
pub mod rasterizer;
pub mod spooler;

pub use dispatcher::RasterPrintDispatcher;
pub use ipp_spooler::IppSpooler;
pub use page_plan::{PagePlan, PageStep};
pub use rasterizer::{PageRasterizer, PopplerRasterizer};
pub use spooler::{EmittedPage, PageSequence, SpoolJob, Spooler};
