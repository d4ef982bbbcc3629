// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// studentreports-server: HTTP surface, configuration and wiring for the
// `studentreports` binary.

pub mod config;
pub mod http;
pub mod pipeline;
pub mod telemetry;

pub use pipeline::ReportPipeline;
