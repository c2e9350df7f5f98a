// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
///
/// Variants carry rendered messages so the error can be cloned out of the
/// dataset cache when several callers wait on the same failed fetch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    /// Token exchange failed or Strava rejected the bearer token.
    #[error("Strava authentication failed: {0}")]
    Auth(String),

    /// A page request failed (transport error, non-success status, bad body).
    #[error("Strava request failed: {0}")]
    Network(String),

    /// Compiled query text was rejected by the analytical engine.
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Activity sync cancelled")]
    Cancelled,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error came from talking to Strava. A caller may retry the
    /// whole sync for these; everything else is a defect or bad input.
    pub fn is_upstream(&self) -> bool {
        matches!(self, AppError::Auth(_) | AppError::Network(_))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Query(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Auth(msg) => {
                tracing::warn!(error = %msg, "Strava authentication failed");
                (StatusCode::BAD_GATEWAY, "auth_error", Some(msg.clone()))
            }
            AppError::Network(msg) => {
                (StatusCode::BAD_GATEWAY, "network_error", Some(msg.clone()))
            }
            AppError::Query(msg) => {
                tracing::error!(error = %msg, "Metric query rejected by engine");
                (StatusCode::INTERNAL_SERVER_ERROR, "query_error", None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "cancelled", None),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type Result<T> = std::result::Result<T, AppError>;
