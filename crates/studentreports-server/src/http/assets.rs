// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Static files under the configured web root (logo, templates, fonts).

use std::io;
use std::path::{Component, Path as FsPath, PathBuf};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use mime_guess::Mime;

use super::AppState;
use super::error::ErrorDetail;

/// `GET /{*path}`: a file below the web root, or 404.
pub async fn serve_web_root(
    State(pipeline): State<AppState>,
    Path(path): Path<String>,
) -> Response {
    let Some(relative) = safe_relative(&path) else {
        return not_found(format!("rejected path `{path}`"));
    };
    let full = pipeline.config().web_root.join(&relative);

    match read_file(&full).await {
        Ok(Some(bytes)) => {
            build_response(bytes, mime_guess::from_path(&relative).first_or_octet_stream())
        }
        Ok(None) => not_found(format!("no file at `{path}`")),
        Err(e) => {
            let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
            response.extensions_mut().insert(ErrorDetail {
                code: "io_error",
                message: format!("read {}: {e}", full.display()),
            });
            response
        }
    }
}

/// The request path as a relative path of plain components. Anything that
/// could climb out of the web root, or names a directory, is refused.
fn safe_relative(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') || trimmed.contains('\\') {
        return None;
    }
    let relative = PathBuf::from(trimmed);
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(relative)
}

/// File contents, or `None` when there is no regular file at `path`.
async fn read_file(path: &FsPath) -> io::Result<Option<Vec<u8>>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => tokio::fs::read(path).await.map(Some),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn not_found(message: String) -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    response.extensions_mut().insert(ErrorDetail {
        code: "not_found",
        message,
    });
    response
}

fn build_response(bytes: Vec<u8>, mime: Mime) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_relative_paths_are_accepted() {
        assert_eq!(safe_relative("imgs/Logo.png"), Some(PathBuf::from("imgs/Logo.png")));
        assert_eq!(
            safe_relative("/fonts/DejaVuSans.ttf"),
            Some(PathBuf::from("fonts/DejaVuSans.ttf"))
        );
    }

    #[test]
    fn escaping_paths_are_refused() {
        let refused = [
            "",
            "imgs/",
            "../secret",
            "imgs/../../etc/passwd",
            "./Logo.png",
            "imgs\\..\\x",
        ];
        for path in refused {
            assert_eq!(safe_relative(path), None, "{path}");
        }
    }
}
