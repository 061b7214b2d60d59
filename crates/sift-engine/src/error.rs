//! Log analysis error types.

use thiserror::Error;

/// Errors that can occur while parsing or analyzing logs.
///
/// Only file-level failures and construction-time misuse are errors.
/// Per-line shortfalls never surface here; they degrade to fallback
/// records and are reported as [`crate::pipeline::LineDiagnostic`]s.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file not found: {path}")]
    NotFound { path: String },

    #[error("permission denied reading {path}")]
    PermissionDenied { path: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: undecodable bytes on line {line}")]
    Decode { path: String, line: usize },

    #[error("invalid regex pattern: {0}")]
    Regex(String),

    #[error("invalid format spec '{name}': {message}")]
    Format { name: String, message: String },

    #[error("invalid filter criteria: {0}")]
    InvalidCriteria(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LogError {
    /// Map an `io::Error` raised while opening or reading `path`.
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_string(),
            },
            _ => Self::Io {
                path: path.to_string(),
                source: err,
            },
        }
    }

    /// True for failures tied to reading a file rather than caller misuse.
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::PermissionDenied { .. } | Self::Io { .. } | Self::Decode { .. }
        )
    }
}

/// Convenience alias for log analysis results.
pub type LogResult<T> = Result<T, LogError>;
