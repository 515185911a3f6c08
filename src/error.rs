//! Error types for the reader.
//!
//! Per-page failures (navigation and extraction, including their timeouts)
//! are recorded in the run report and never abort a crawl. Everything else
//! fails the call outright.

use std::path::PathBuf;
use std::time::Duration;

/// Failure reported by a browser session command (navigate, read source, ...).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct SessionError(pub String);

impl SessionError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<fantoccini::error::CmdError> for SessionError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        Self(err.to_string())
    }
}

/// Top-level error type for reader operations.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// The browser engine could not be started or a page session could not be opened.
    #[error("failed to start browser engine: {0}")]
    EngineInit(String),

    /// A page failed to load in time or the navigation itself failed.
    #[error("navigation to {url} failed: {cause}")]
    Navigation { url: String, cause: String },

    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    /// Reading the DOM of a loaded page failed.
    #[error("extraction from {url} failed: {cause}")]
    Extraction { url: String, cause: String },

    #[error("extraction from {url} timed out after {timeout:?}")]
    ExtractionTimeout { url: String, timeout: Duration },

    /// Invalid configuration, detected before any page is fetched.
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;

impl CrawlError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn navigation(url: impl Into<String>, cause: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            cause: cause.to_string(),
        }
    }

    pub fn extraction(url: impl Into<String>, cause: impl ToString) -> Self {
        Self::Extraction {
            url: url.into(),
            cause: cause.to_string(),
        }
    }

    /// Wrap a `std::io::Error` with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
