//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; any [`tb_core::Error`]
//! converts with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tb_core::Error;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn inner(&self) -> &Error {
        &self.inner
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::new(e)
    }
}

/// Stable machine-readable code for each error variant.
fn error_code(err: &Error) -> &'static str {
    match err {
        Error::NotFound { .. } => "not_found",
        Error::Unauthorized(_) => "unauthorized",
        Error::Forbidden(_) => "forbidden",
        Error::Validation(_) => "validation_error",
        Error::UnsupportedMediaType(_) => "unsupported_media_type",
        Error::PayloadTooLarge(_) => "payload_too_large",
        Error::Database { .. } => "database_error",
        Error::Io { .. } => "io_error",
        Error::Tool { .. } => "tool_error",
        Error::Probe(_) => "probe_error",
        Error::Storage(_) => "storage_error",
        Error::Pipeline { .. } => "pipeline_error",
        Error::Commit { .. } => "commit_error",
        Error::Internal(_) => "internal_error",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                class = ?self.inner.class(),
                request_id = self.request_id.as_deref().unwrap_or("-"),
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": error_code(&self.inner),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_produces_404() {
        let response = AppError::new(Error::not_found("video", "abc")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn rejected_content_type_produces_415() {
        let err = AppError::new(Error::UnsupportedMediaType("video/quicktime".into()));
        assert_eq!(err.into_response().status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn storage_fault_produces_502() {
        let err = AppError::new(Error::Storage("503 from bucket".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn commit_fault_produces_500() {
        let err = AppError::new(Error::commit("landscape/k.mp4", "database is locked"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn codes_are_distinct_for_client_faults() {
        assert_eq!(error_code(&Error::Forbidden("x".into())), "forbidden");
        assert_eq!(error_code(&Error::Unauthorized("x".into())), "unauthorized");
        assert_eq!(error_code(&Error::PayloadTooLarge("x".into())), "payload_too_large");
    }

    #[test]
    fn with_request_id() {
        let err = AppError::new(Error::Internal("oops".into())).with_request_id("req-123".into());
        assert_eq!(err.request_id.as_deref(), Some("req-123"));
    }
}
