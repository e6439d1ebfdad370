//! Error taxonomy for filesystem and archive operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by filesystem primitives, archive engines and tasks.
///
/// `Interrupted` and `LimitReached` are stop sentinels: walks return them
/// to unwind early and callers treat them as a controlled stop rather
/// than a failure. Everything else is a hard error.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation stopped by a cooperative interrupt.
    #[error("Operation interrupted")]
    Interrupted,

    /// Search stopped after reaching the caller-supplied result limit.
    #[error("Result limit reached")]
    LimitReached,

    /// One or more entries failed inside a directory walk.
    #[error("{failed} entries failed: {message}")]
    Partial { failed: usize, message: String },

    /// Archive engine failure.
    #[error("Archive error at {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// Archive format not recognized by the engine.
    #[error("Unsupported archive format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl OpsError {
    /// Create an I/O error with path context, classifying common kinds.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::Interrupted => Self::Interrupted,
            _ => Self::Io { path, source },
        }
    }

    /// Create an archive error with path context.
    pub fn archive(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an error from a bare message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether this error is a controlled early-stop sentinel.
    pub fn is_stop_sentinel(&self) -> bool {
        matches!(self, Self::Interrupted | Self::LimitReached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_classification() {
        let err = OpsError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, OpsError::PermissionDenied { .. }));

        let err = OpsError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, OpsError::NotFound { .. }));
    }

    #[test]
    fn test_interrupted_reader_error_maps_to_sentinel() {
        let err = OpsError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::Interrupted, "stop"),
        );
        assert!(err.is_stop_sentinel());
    }

    #[test]
    fn test_stop_sentinels() {
        assert!(OpsError::Interrupted.is_stop_sentinel());
        assert!(OpsError::LimitReached.is_stop_sentinel());
        assert!(!OpsError::other("boom").is_stop_sentinel());
    }
}
