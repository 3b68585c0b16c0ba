//! Feed lifecycle: first import, validity checks, download and reload.
//!
//! The publisher's `metadata.xml` states the last day the timetable is
//! valid. Once that is close, the zipped feed is downloaded again,
//! unpacked over the data directory, imported into the snapshot store and
//! published as a new index generation.

mod archive;
mod client;
mod error;
mod metadata;
mod refresh;

pub use archive::extract_archive;
pub use client::{FeedClient, FeedClientConfig};
pub use error::UpdateError;
pub use metadata::{FeedMetadata, METADATA_FILE};
pub use refresh::{FeedInfo, FeedUpdater, UpdateOutcome, UpdaterConfig};
