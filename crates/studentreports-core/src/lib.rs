// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Student reports: core types, error taxonomy, and the pipeline seams shared
// by the record source, renderer, print dispatcher and HTTP surface.

pub mod config;
pub mod error;
pub mod integrity;
pub mod traits;
pub mod types;

pub use config::ReportConfig;
pub use error::ReportError;
pub use traits::*;
pub use types::*;
