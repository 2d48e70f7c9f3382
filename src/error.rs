// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent error responses.
//!
//! Expected failures (bad credentials, validation) are rendered into the
//! portal page by the handlers. Only what cannot be shown in-page ends up here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Template rendering failed: {0}")]
    Render(#[from] minijinja::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = match &self {
            AppError::Render(err) => {
                tracing::error!(error = %err, "Template rendering failed");
                "render_error"
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "internal_error"
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
