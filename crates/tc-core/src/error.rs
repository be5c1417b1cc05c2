//! Unified error type for the tunecast workspace.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in tunecast.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "asset", "artifact").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A catalog database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation on generated storage failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool could not be located, spawned, or timed out.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The encoder process was terminated by a signal before finishing.
    #[error("{tool} was killed before finishing")]
    ProcessKilled {
        /// Name of the tool that was killed.
        tool: String,
    },

    /// The encoder process exited with a non-tolerated status code.
    #[error("{tool} exited with status {code}: {message}")]
    ProcessFailed {
        /// Name of the tool that failed.
        tool: String,
        /// Process exit code.
        code: i32,
        /// Tail of the process stderr.
        message: String,
    },

    /// Source inspection failed.
    #[error("Probe error: {0}")]
    Probe(String),

    /// A wait exceeded its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Tool { .. } => 502,
            Error::ProcessKilled { .. } => 503,
            Error::ProcessFailed { .. } => 502,
            Error::Probe(_) => 422,
            Error::Timeout(_) => 504,
            Error::Cancelled => 503,
            Error::Internal(_) => 500,
        }
    }

    /// Soft failures are retryable and are not surfaced on opportunistic paths.
    pub fn is_soft(&self) -> bool {
        matches!(self, Error::ProcessKilled { .. } | Error::Cancelled)
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

    /// Rebuild an owned copy of this error.
    ///
    /// Generation outcomes are fanned out to every waiter, but `Error` is not
    /// `Clone` because of its boxed sources; those collapse to their message.
    pub fn duplicate(&self) -> Self {
        match self {
            Error::NotFound { entity, id } => Error::NotFound {
                entity: entity.clone(),
                id: id.clone(),
            },
            Error::Validation(m) => Error::Validation(m.clone()),
            Error::Database { source } => Error::database(source.to_string()),
            Error::Io { source } => Error::Io {
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            Error::Tool { tool, message } => Error::tool(tool.clone(), message.clone()),
            Error::ProcessKilled { tool } => Error::ProcessKilled { tool: tool.clone() },
            Error::ProcessFailed {
                tool,
                code,
                message,
            } => Error::ProcessFailed {
                tool: tool.clone(),
                code: *code,
                message: message.clone(),
            },
            Error::Probe(m) => Error::Probe(m.clone()),
            Error::Timeout(m) => Error::Timeout(m.clone()),
            Error::Cancelled => Error::Cancelled,
            Error::Internal(m) => Error::Internal(m.clone()),
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
        let err = Error::not_found("asset", 42);
        assert_eq!(err.to_string(), "asset not found: 42");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn validation_display() {
        let err = Error::Validation("bad artifact".into());
        assert_eq!(err.to_string(), "Validation error: bad artifact");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn process_failed_display() {
        let err = Error::ProcessFailed {
            tool: "ffmpeg".into(),
            code: 2,
            message: "Invalid data".into(),
        };
        assert_eq!(err.to_string(), "ffmpeg exited with status 2: Invalid data");
        assert_eq!(err.http_status(), 502);
        assert!(!err.is_soft());
    }

    #[test]
    fn killed_is_soft() {
        let err = Error::ProcessKilled {
            tool: "ffmpeg".into(),
        };
        assert!(err.is_soft());
        assert!(Error::Cancelled.is_soft());
        assert!(!Error::Probe("x".into()).is_soft());
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let err = Error::Timeout("segment 3".into());
        assert_eq!(err.http_status(), 504);
    }

    #[test]
    fn duplicate_preserves_variant_and_message() {
        let err = Error::database("connection refused");
        let copy = err.duplicate();
        assert!(matches!(copy, Error::Database { .. }));
        assert_eq!(copy.to_string(), err.to_string());

        let io = Error::from(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "ro"));
        match io.duplicate() {
            Error::Io { source } => assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied),
            other => panic!("unexpected {other:?}"),
        }
    }
}
