//! Proxy-level error type and its `axum` response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[from] reqwest::Error),

    #[error("upstream returned status {status}")]
    UpstreamStatus { status: StatusCode, body: Bytes },

    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    #[error("HEALER_UPSTREAM_BASE_URL is not set")]
    MissingUpstreamBaseUrl,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::UpstreamStatus { status, body } => {
                (status, body).into_response()
            }
            ProxyError::UpstreamUnreachable(e) => {
                tracing::warn!(error = %e, "upstream unreachable");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"error": {"message": e.to_string(), "type": "upstream_unreachable"}})),
                )
                    .into_response()
            }
            ProxyError::InvalidRequestBody(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": {"message": msg, "type": "invalid_request_error"}})),
            )
                .into_response(),
            ProxyError::MissingUpstreamBaseUrl => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"message": "upstream base URL is not configured", "type": "configuration_error"}})),
            )
                .into_response(),
        }
    }
}
