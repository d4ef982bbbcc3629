// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error taxonomy for the report pipeline.
//
// Every variant is terminal for the request that raised it. Nothing in the
// pipeline retries; the HTTP layer turns each variant into a 5xx response.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for every stage of the report pipeline.
#[derive(Debug, Error)]
pub enum ReportError {
    // -- Record source --
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    // -- Report renderer --
    #[error("report template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("report template is invalid: {0}")]
    TemplateInvalid(String),

    #[error("report rendering failed: {0}")]
    RenderFailed(String),

    // -- Print dispatcher --
    #[error("PDF document is corrupt: {0}")]
    DocumentCorrupt(String),

    #[error("page rasterization failed: {0}")]
    RasterizeFailed(String),

    #[error("printer unavailable: {0}")]
    PrinterUnavailable(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Stable machine-readable code, used in HTTP error bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::TemplateNotFound(_) => "template_not_found",
            Self::TemplateInvalid(_) => "template_invalid",
            Self::RenderFailed(_) => "render_failed",
            Self::DocumentCorrupt(_) => "document_corrupt",
            Self::RasterizeFailed(_) => "rasterize_failed",
            Self::PrinterUnavailable(_) => "printer_unavailable",
            Self::Io(_) => "io_error",
        }
    }

    /// Whether the failure lies with an external dependency that is down
    /// (database or printer) rather than with the request's own content.
    pub fn is_dependency_outage(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable(_) | Self::PrinterUnavailable(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_not_found_names_the_path() {
        let err = ReportError::TemplateNotFound(PathBuf::from("/srv/www/Reports/Student.report.json"));
        assert!(err.to_string().contains("/srv/www/Reports/Student.report.json"));
        assert_eq!(err.code(), "template_not_found");
    }

    #[test]
    fn outages_are_only_storage_and_printer() {
        assert!(ReportError::StorageUnavailable("locked".into()).is_dependency_outage());
        assert!(ReportError::PrinterUnavailable("offline".into()).is_dependency_outage());
        assert!(!ReportError::RenderFailed("bad".into()).is_dependency_outage());
        assert!(!ReportError::DocumentCorrupt("eof".into()).is_dependency_outage());
    }

    #[test]
    fn io_errors_convert() {
        let err: ReportError = std::io::Error::other("disk gone").into();
        assert_eq!(err.code(), "io_error");
    }
}
