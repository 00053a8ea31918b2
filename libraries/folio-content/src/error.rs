use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading content into the cache
#[derive(Debug, Error)]
pub enum ContentError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content was read but is not UTF-8 text
    #[error("Content of {0} is not valid UTF-8")]
    Invalid(String),
}

/// Result type for content operations
pub type Result<T> = std::result::Result<T, ContentError>;
