//! Durable copy of the last imported feed.
//!
//! The server rebuilds its index from here at startup, so a restart does not
//! have to re-parse the GTFS text files or re-download anything.

mod error;
mod snapshot;

pub use error::StoreError;
pub use snapshot::{IMPORTED_AT_KEY, SnapshotStore, VALID_TO_KEY};
