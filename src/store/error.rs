//! Post store error types

use std::io;
use thiserror::Error;

/// Failures of the file-backed post store
///
/// Display texts name the title only. On-disk paths go to the error log,
/// never into a response.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No file exists for the title yet
    #[error("post '{title}' does not exist")]
    NotFound { title: String },

    /// The posts directory itself is missing
    #[error("post storage is unavailable")]
    StorageUnavailable,

    #[error("failed to read post '{title}': {source}")]
    Read {
        title: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write post '{title}': {source}")]
    Write {
        title: String,
        #[source]
        source: io::Error,
    },

    /// Title would not map to a single file inside the posts directory
    #[error("invalid post title '{0}'")]
    InvalidTitle(String),
}

impl StoreError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
