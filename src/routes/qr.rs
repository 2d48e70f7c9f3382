// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! QR code download.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::CurrentSession;
use crate::services::qr::{DownloadFormat, QrDownload};
use crate::views::QrPanel;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/qr/download", get(download))
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    /// `png` (default), `jpg` or `jpeg`
    #[serde(default)]
    format: Option<String>,
}

/// Serve the current symbol as a file. Failures produce an empty 204.
async fn download(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    Query(params): Query<DownloadParams>,
) -> Response {
    let format = match params.format.as_deref().map(str::parse::<DownloadFormat>) {
        None => DownloadFormat::default(),
        Some(Ok(format)) => format,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Error downloading QR code");
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    let panel = match QrPanel::for_session(current.session(), &state.qr) {
        Ok(panel) => panel,
        Err(e) => {
            tracing::warn!(error = %e, "Error downloading QR code");
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    match state.qr.download(panel.symbol(), panel.student_id(), format) {
        Some(file) => attachment(file),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn attachment(file: QrDownload) -> Response {
    let disposition = content_disposition(&file.filename);
    let disposition = match HeaderValue::from_str(&disposition) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Error downloading QR code");
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(file.format.content_type()),
            ),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        file.bytes,
    )
        .into_response()
}

/// `attachment` header with an ASCII fallback name and an RFC 5987 `filename*`.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}
