//! Feed update error types.

use std::path::PathBuf;

use crate::gtfs::FeedError;
use crate::store::StoreError;

/// Errors that can occur while importing, downloading or reloading a feed.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Feed source answered with a non-success status
    #[error("download failed with status {status}")]
    Status { status: u16 },

    /// Download exceeded the size limit
    #[error("download exceeded {limit} bytes")]
    TooLarge { limit: u64 },

    /// No source URL configured
    #[error("no feed source URL configured")]
    NoSource,

    /// Local file operation failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive could not be read
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Archive entry would be written outside the data directory
    #[error("unsafe archive entry: {name}")]
    UnsafeEntry { name: String },

    /// metadata.xml missing, malformed or without a usable ValidTo
    #[error("feed metadata error: {message}")]
    Metadata { message: String },

    /// Feed files could not be parsed
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Snapshot store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Blocking worker panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
