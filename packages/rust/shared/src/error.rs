//! Error types for docgrab.
//!
//! Library crates use [`DocgrabError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docgrab operations.
#[derive(Debug, thiserror::Error)]
pub enum DocgrabError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error that could not be absorbed by the fetch retry policy.
    #[error("network error: {0}")]
    Network(String),

    /// XML, URL, or pattern parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Unusable input (empty URL, URL without host, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// HTML-to-text conversion or serialization error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Interactive prompt failed or was interrupted.
    #[error("prompt error: {0}")]
    Prompt(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocgrabError>;

impl DocgrabError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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

    /// True for errors caused by the caller's input rather than the run itself.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
