//! Snapshot store error types.

use std::path::PathBuf;

/// Errors that can occur while reading or writing the snapshot store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// File or directory could not be created, read or written
    #[error("store I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored JSON could not be (de)serialized
    #[error("store file {} is not valid: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// System clock is before the unix epoch
    #[error("system time before unix epoch")]
    Clock,
}
