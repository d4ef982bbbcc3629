// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP surface.

mod assets;
mod error;
mod handlers;
mod middleware;

use std::sync::Arc;

use axum::{Router, middleware::from_fn, routing::get};

use crate::pipeline::ReportPipeline;

pub use error::{ApiError, ApiErrorBody, ApiErrorMessage, ErrorDetail};

pub type AppState = Arc<ReportPipeline>;

/// Routes, wrapped in response logging and then CORS. Any other path is
/// looked up under the web root.
pub fn router(pipeline: AppState) -> Router {
    Router::new()
        .route("/api/StudentReports", get(handlers::print_report))
        .route("/api/StudentReports/Printer", get(handlers::list_printers))
        .route("/{*path}", get(assets::serve_web_root))
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::cors))
        .with_state(pipeline)
}
