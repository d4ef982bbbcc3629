// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use studentreports_core::error::ReportError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
}

/// Diagnostic attached to error responses for the response logger.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// A pipeline failure on its way out as a 5xx response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        let status = if err.is_dependency_outage() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = ErrorDetail {
            code: self.code,
            message: self.message.clone(),
        };
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        response.extensions_mut().insert(detail);
        response
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn outages_map_to_service_unavailable() {
        let storage = ApiError::from(ReportError::StorageUnavailable("down".into()));
        let printer = ApiError::from(ReportError::PrinterUnavailable("absent".into()));
        assert_eq!(storage.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(printer.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn other_failures_map_to_internal_error() {
        let cases = [
            ReportError::TemplateNotFound(PathBuf::from("Student.report.json")),
            ReportError::TemplateInvalid("bad".into()),
            ReportError::RenderFailed("bad".into()),
            ReportError::DocumentCorrupt("bad".into()),
            ReportError::RasterizeFailed("bad".into()),
        ];
        for err in cases {
            assert_eq!(
                ApiError::from(err).status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[test]
    fn response_carries_detail_extension() {
        let response = ApiError::from(ReportError::RenderFailed("no dataset".into())).into_response();
        let detail = response
            .extensions()
            .get::<ErrorDetail>()
            .expect("detail attached");
        assert_eq!(detail.code, "render_failed");
    }
}
