// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use super::AppState;
use super::error::ApiError;

/// `GET /api/StudentReports`: print the report. Empty body on success.
pub async fn print_report(State(pipeline): State<AppState>) -> Result<StatusCode, ApiError> {
    pipeline.print_report().await?;
    Ok(StatusCode::OK)
}

/// `GET /api/StudentReports/Printer`: installed printer names.
pub async fn list_printers(
    State(pipeline): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(pipeline.installed_printers().await?))
}
