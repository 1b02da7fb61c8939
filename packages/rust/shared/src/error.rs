//! Error types for scholardigest.
//!
//! Library crates use [`ScholarDigestError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all scholardigest operations.
#[derive(Debug, thiserror::Error)]
pub enum ScholarDigestError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching an article or resource.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or JSON parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The scholarly search provider failed or returned an error status.
    #[error("search provider error: {0}")]
    Search(String),

    /// The text-generation model failed or returned an unusable response.
    #[error("generation error: {0}")]
    Generation(String),

    /// The email template could not be read.
    #[error("email template unavailable at {path:?}: {source}")]
    TemplateUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A declared content format the fetcher does not handle.
    #[error("unsupported file format: {format}")]
    UnsupportedFormat { format: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad expansion table, invalid URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScholarDigestError>;

impl ScholarDigestError {
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

    /// Create an unsupported-format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
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
        let err = ScholarDigestError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = ScholarDigestError::unsupported_format("docx");
        assert_eq!(err.to_string(), "unsupported file format: docx");

        let err = ScholarDigestError::Search("HTTP 401 Unauthorized".into());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn template_error_names_path() {
        let err = ScholarDigestError::TemplateUnavailable {
            path: PathBuf::from("missing/emailtemplate.txt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("missing/emailtemplate.txt"));
    }
}
