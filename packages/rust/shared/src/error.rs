//! Error types for Catfeed.
//!
//! Library crates use [`CatfeedError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Catfeed operations.
#[derive(Debug, thiserror::Error)]
pub enum CatfeedError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input file does not exist. Raised before the tokenizer is built.
    #[error("file not found: {path:?}")]
    FileNotFound { path: PathBuf },

    /// The XML tokenizer reported a syntax error. Fatal to the whole parse.
    #[error("malformed input at byte {position}: {message}")]
    MalformedInput { position: u64, message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing key, invalid record, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CatfeedError>;

impl CatfeedError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a malformed-input error with the tokenizer byte position.
    pub fn malformed(position: u64, msg: impl Into<String>) -> Self {
        Self::MalformedInput {
            position,
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CatfeedError::config("missing db path");
        assert_eq!(err.to_string(), "config error: missing db path");

        let err = CatfeedError::malformed(42, "unexpected end of input");
        assert!(err.to_string().contains("byte 42"));
        assert!(err.to_string().contains("unexpected end of input"));
    }

    #[test]
    fn file_not_found_carries_path() {
        let err = CatfeedError::FileNotFound {
            path: PathBuf::from("/tmp/missing.xml"),
        };
        assert!(err.to_string().contains("missing.xml"));
    }
}
