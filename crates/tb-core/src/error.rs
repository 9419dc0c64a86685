//! Unified error type for the tubely application.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`]
//! and a coarse failure class via [`Error::class`].

use std::fmt;

/// Which side of the request/response contract a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The caller sent something we refuse to process (4xx).
    ClientInput,
    /// A tool, disk, database, or object store failed underneath us (5xx).
    Environment,
    /// The object store and the metadata store disagree (5xx).
    Inconsistency,
}

/// Unified error type covering all failure modes in tubely.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "video").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller lacks permission for the requested action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The declared content type is not one we accept.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The request body exceeds the configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Media probing failed or produced unusable output.
    #[error("Probe error: {0}")]
    Probe(String),

    /// The object store rejected or failed an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A pipeline step failed.
    #[error("Pipeline error [{step}]: {message}")]
    Pipeline {
        /// The pipeline step that failed.
        step: String,
        /// Human-readable error description.
        message: String,
    },

    /// The object was stored but the metadata record could not be updated.
    #[error("Commit error [{key}]: {message}")]
    Commit {
        /// Object key that was uploaded.
        key: String,
        /// Human-readable error description.
        message: String,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Unauthorized(_) => 401,
            Error::Forbidden(_) => 403,
            Error::Validation(_) => 400,
            Error::UnsupportedMediaType(_) => 415,
            Error::PayloadTooLarge(_) => 413,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Tool { .. } => 502,
            Error::Probe(_) => 502,
            Error::Storage(_) => 502,
            Error::Pipeline { .. } => 500,
            Error::Commit { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Classify this error as client input, environment, or inconsistency.
    pub fn class(&self) -> FaultClass {
        match self {
            Error::NotFound { .. }
            | Error::Unauthorized(_)
            | Error::Forbidden(_)
            | Error::Validation(_)
            | Error::UnsupportedMediaType(_)
            | Error::PayloadTooLarge(_) => FaultClass::ClientInput,
            Error::Commit { .. } => FaultClass::Inconsistency,
            _ => FaultClass::Environment,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Pipeline`].
    pub fn pipeline(step: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Pipeline {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Commit`].
    pub fn commit(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Commit {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("video", "abc-123");
        assert_eq!(err.to_string(), "video not found: abc-123");
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.class(), FaultClass::ClientInput);
    }

    #[test]
    fn unauthorized_display() {
        let err = Error::Unauthorized("bad token".into());
        assert_eq!(err.to_string(), "Unauthorized: bad token");
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn forbidden_is_client_input() {
        let err = Error::Forbidden("not the owner".into());
        assert_eq!(err.http_status(), 403);
        assert_eq!(err.class(), FaultClass::ClientInput);
    }

    #[test]
    fn unsupported_media_type() {
        let err = Error::UnsupportedMediaType("video/webm".into());
        assert_eq!(err.to_string(), "Unsupported media type: video/webm");
        assert_eq!(err.http_status(), 415);
        assert_eq!(err.class(), FaultClass::ClientInput);
    }

    #[test]
    fn payload_too_large() {
        let err = Error::PayloadTooLarge("limit is 10 bytes".into());
        assert_eq!(err.http_status(), 413);
        assert_eq!(err.class(), FaultClass::ClientInput);
    }

    #[test]
    fn database_display() {
        let err = Error::database("connection refused");
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.class(), FaultClass::Environment);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.class(), FaultClass::Environment);
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn probe_is_environment_fault() {
        let err = Error::Probe("no streams".into());
        assert_eq!(err.to_string(), "Probe error: no streams");
        assert_eq!(err.http_status(), 502);
        assert_eq!(err.class(), FaultClass::Environment);
    }

    #[test]
    fn storage_display() {
        let err = Error::Storage("bucket unreachable".into());
        assert_eq!(err.http_status(), 502);
        assert_eq!(err.class(), FaultClass::Environment);
    }

    #[test]
    fn pipeline_display() {
        let err = Error::pipeline("normalize", "output missing");
        assert_eq!(err.to_string(), "Pipeline error [normalize]: output missing");
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn commit_is_inconsistency() {
        let err = Error::commit("landscape/abc.mp4", "database is locked");
        assert_eq!(
            err.to_string(),
            "Commit error [landscape/abc.mp4]: database is locked"
        );
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.class(), FaultClass::Inconsistency);
    }

    #[test]
    fn internal_display() {
        let err = Error::Internal("unexpected state".into());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
        assert_eq!(err.http_status(), 500);
    }
}
