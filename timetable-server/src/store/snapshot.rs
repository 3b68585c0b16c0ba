//! JSON snapshot of the last imported feed plus a small metadata table.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::gtfs::Feed;

use super::error::StoreError;

/// Metadata key holding the unix time of the last import.
pub const IMPORTED_AT_KEY: &str = "imported_at";

/// Metadata key holding the feed's `ValidTo` date (`YYYY-MM-DD`), when known.
pub const VALID_TO_KEY: &str = "valid_to";

const FEED_FILE: &str = "feed.json";
const META_FILE: &str = "meta.json";

/// Durable store for one feed snapshot.
///
/// Lives in a directory holding `feed.json` (the whole [`Feed`]) and
/// `meta.json` (string key/value pairs). An import replaces the previous
/// snapshot wholesale: the new file is written beside the old one and
/// renamed over it, so readers never see a partial snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open the store in `dir`, creating the directory if it doesn't exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// True when no snapshot has been imported yet.
    pub fn is_empty(&self) -> bool {
        !self.feed_path().exists()
    }

    /// Replace the stored snapshot with `feed` and stamp the import time.
    ///
    /// Metadata describes one snapshot, so the previous entries are dropped.
    pub fn import(&self, feed: &Feed) -> Result<(), StoreError> {
        write_json(&self.feed_path(), feed)?;

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|_| StoreError::Clock)?
            .as_secs();
        let meta = BTreeMap::from([(IMPORTED_AT_KEY.to_string(), now.to_string())]);
        write_json(&self.meta_path(), &meta)?;

        info!(
            records = feed.record_count(),
            dir = %self.dir.display(),
            "Imported feed snapshot"
        );
        Ok(())
    }

    /// Read the stored snapshot, or `None` if nothing was imported yet.
    pub fn load(&self) -> Result<Option<Feed>, StoreError> {
        let path = self.feed_path();
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// Value stored under `key`.
    pub fn meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_meta()?.remove(key))
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut meta = self.read_meta()?;
        meta.insert(key.to_string(), value.to_string());
        write_json(&self.meta_path(), &meta)
    }

    /// When the current snapshot was imported.
    pub fn imported_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .meta(IMPORTED_AT_KEY)?
            .and_then(|secs| secs.parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0)))
    }

    fn read_meta(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let path = self.meta_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        read_json(&path)
    }

    fn feed_path(&self) -> PathBuf {
        self.dir.join(FEED_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `value` to a temporary sibling of `path`, then rename it into place.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    let io_err = |source| StoreError::Io {
        path: tmp.clone(),
        source,
    };

    let file = File::create(&tmp).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|source| StoreError::Json {
        path: tmp.clone(),
        source,
    })?;
    writer.flush().map_err(io_err)?;
    drop(writer);

    std::fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
