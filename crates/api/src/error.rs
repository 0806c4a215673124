//! API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use landmark_source::FailureCause;
use serde::Serialize;
use session::SessionError;
use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Metrics exporter is not installed")]
    MetricsUnavailable,
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<FailureCause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Session(SessionError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            ApiError::Session(SessionError::Resource(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Session(SessionError::MonitorClosed) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Session(SessionError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MetricsUnavailable => StatusCode::NOT_FOUND,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Session(SessionError::Resource(failure)) => ErrorBody {
                code: "RESOURCE_FAILURE",
                message: failure.cause.message().to_string(),
                cause: Some(failure.cause),
                detail: Some(failure.detail.clone()),
            },
            ApiError::Session(SessionError::InvalidTransition { .. }) => ErrorBody {
                code: "INVALID_TRANSITION",
                message: self.to_string(),
                cause: None,
                detail: None,
            },
            ApiError::Session(SessionError::MonitorClosed) => ErrorBody {
                code: "MONITOR_CLOSED",
                message: self.to_string(),
                cause: None,
                detail: None,
            },
            ApiError::Session(SessionError::Config(_)) => ErrorBody {
                code: "CONFIG",
                message: self.to_string(),
                cause: None,
                detail: None,
            },
            ApiError::MetricsUnavailable => ErrorBody {
                code: "NOT_FOUND",
                message: self.to_string(),
                cause: None,
                detail: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }
        (status, Json(self.body())).into_response()
    }
}
