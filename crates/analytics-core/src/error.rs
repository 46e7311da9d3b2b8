use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the analytics pipeline.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The service credential could not be loaded or exchanged for a token.
    #[error("Credential error: {0}")]
    Credential(String),

    /// A transport-level HTTP failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The remote answered with a non-success status code.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnalyticsError {
    /// `true` for failures that should abort a whole retrieval run rather
    /// than a single item.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AnalyticsError::Http(_) | AnalyticsError::HttpStatus { .. }
        )
    }
}

/// Convenience alias used throughout the analytics crates.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
