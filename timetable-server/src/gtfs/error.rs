//! Feed loading error types.

use std::path::PathBuf;

/// Errors that can occur while reading a feed from disk.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A required feed file is missing
    #[error("missing feed file: {}", path.display())]
    MissingFile { path: PathBuf },

    /// File could not be opened or read
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV structure could not be parsed
    #[error("CSV error in {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },
}
