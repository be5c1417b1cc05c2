//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; any [`tc_core::Error`]
//! converts with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: tc_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: tc_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn inner(&self) -> &tc_core::Error {
        &self.inner
    }

    /// Machine-readable code included in the JSON body.
    pub fn code(&self) -> &'static str {
        match &self.inner {
            tc_core::Error::NotFound { .. } => "not_found",
            tc_core::Error::Validation(_) => "validation_error",
            tc_core::Error::Database { .. } => "database_error",
            tc_core::Error::Io { .. } => "io_error",
            tc_core::Error::Tool { .. } => "tool_error",
            tc_core::Error::ProcessKilled { .. } => "process_killed",
            tc_core::Error::ProcessFailed { .. } => "process_failed",
            tc_core::Error::Probe(_) => "probe_error",
            tc_core::Error::Timeout(_) => "timeout",
            tc_core::Error::Cancelled => "cancelled",
            tc_core::Error::Internal(_) => "internal_error",
        }
    }
}

impl From<tc_core::Error> for AppError {
    fn from(e: tc_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.code(),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
