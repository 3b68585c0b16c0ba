//! Startup import and periodic refresh of the served timetable.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::gtfs::{Feed, load_feed};
use crate::store::{SnapshotStore, VALID_TO_KEY};
use crate::timetable::{IndexHandle, TimetableIndex};

use super::archive::extract_archive;
use super::client::{FeedClient, FeedClientConfig};
use super::error::UpdateError;
use super::metadata::{FeedMetadata, METADATA_FILE};

/// Name the archive is downloaded under, inside the data directory.
const DOWNLOAD_FILE: &str = "feed.zip.download";

/// Directory a new archive is unpacked into before it replaces the live files.
const STAGING_DIR: &str = ".staging";

/// Configuration for the feed updater.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Directory holding the unpacked GTFS text files and `metadata.xml`.
    pub data_dir: PathBuf,
    /// Directory of the snapshot store.
    pub store_dir: PathBuf,
    /// Zipped feed URL. Periodic refresh is disabled without one.
    pub source_url: Option<String>,
    /// Time between validity checks.
    pub refresh_interval: Duration,
    /// Download a new feed once this few days of validity remain.
    pub threshold_days: i64,
}

impl UpdaterConfig {
    /// Create a config for `data_dir`, with the store in `<data_dir>/store`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            store_dir: data_dir.join("store"),
            data_dir,
            source_url: None,
            refresh_interval: Duration::from_secs(24 * 60 * 60),
            threshold_days: 3,
        }
    }

    /// Set the feed source URL.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Set a custom store directory.
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }
}

/// Facts about the currently served feed, for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedInfo {
    pub imported_at: Option<DateTime<Utc>>,
    /// Last valid day, `YYYY-MM-DD`.
    pub valid_to: Option<String>,
}

/// Result of a validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// More than the threshold remains; nothing was downloaded.
    Fresh { days_left: i64 },
    /// A new feed was installed and published under this generation.
    Updated { generation: u64 },
}

/// Owns the snapshot store and keeps the [`IndexHandle`] up to date.
///
/// Reloads are serialized: a check or download waits for any reload already
/// running. A failed reload leaves the served index untouched.
pub struct FeedUpdater {
    config: UpdaterConfig,
    store: SnapshotStore,
    handle: Arc<IndexHandle>,
    client: Option<FeedClient>,
    info: RwLock<FeedInfo>,
    reload: Mutex<()>,
}

impl FeedUpdater {
    /// Build the first index.
    ///
    /// An empty store is filled from the GTFS files in the data directory.
    /// The index itself is always built from those files; the store only
    /// records what was last imported.
    pub async fn load_or_import(config: UpdaterConfig) -> Result<Self, UpdateError> {
        let client = config
            .source_url
            .as_ref()
            .map(|url| FeedClient::new(FeedClientConfig::new(url.clone())))
            .transpose()?;

        let data_dir = config.data_dir.clone();
        let store_dir = config.store_dir.clone();
        let (store, index, info) = tokio::task::spawn_blocking(move || {
            let store = SnapshotStore::open(store_dir)?;
            let feed = if store.is_empty() {
                info!(dir = %data_dir.display(), "Store empty, importing GTFS data");
                import_from_disk(&store, &data_dir)?
            } else {
                info!(dir = %data_dir.display(), "Found imported snapshot, reading GTFS data");
                load_feed(&data_dir)?
            };
            let index = build_index(&feed);
            let info = read_info(&store)?;
            Ok::<_, UpdateError>((store, index, info))
        })
        .await??;

        Ok(Self {
            config,
            store,
            handle: Arc::new(IndexHandle::new(index)),
            client,
            info: RwLock::new(info),
            reload: Mutex::new(()),
        })
    }

    /// Handle serving the current index.
    pub fn handle(&self) -> Arc<IndexHandle> {
        Arc::clone(&self.handle)
    }

    /// Facts about the served feed.
    pub async fn feed_info(&self) -> FeedInfo {
        self.info.read().await.clone()
    }

    /// Download a new feed if the current one expires within the threshold.
    pub async fn check_and_update(&self) -> Result<UpdateOutcome, UpdateError> {
        let _guard = self.reload.lock().await;

        let metadata = self.read_metadata().await?;
        let days_left = metadata.days_left(today())?;
        if days_left > self.config.threshold_days {
            info!(
                valid_to = %metadata.valid_to,
                days_left,
                "Feed still valid, no update needed"
            );
            return Ok(UpdateOutcome::Fresh { days_left });
        }

        info!(days_left, "Feed about to expire, downloading update");
        let generation = self.download_locked().await?;
        Ok(UpdateOutcome::Updated { generation })
    }

    /// Download, unpack, import and publish a new feed unconditionally.
    /// Returns the new generation number.
    pub async fn download_and_reload(&self) -> Result<u64, UpdateError> {
        let _guard = self.reload.lock().await;
        self.download_locked().await
    }

    /// Unpack a feed archive already on disk, then import and publish it.
    /// Returns the new generation number.
    pub async fn install_archive(&self, zip_path: &Path) -> Result<u64, UpdateError> {
        let _guard = self.reload.lock().await;
        self.install_locked(zip_path.to_path_buf(), false).await
    }

    /// Spawn the periodic validity check. Returns `None` when no source URL
    /// is configured.
    pub fn spawn_refresh_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if self.client.is_none() {
            info!("No feed source URL configured, skipping periodic updates");
            return None;
        }

        let period = self.config.refresh_interval;
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // First tick is immediate, skip it
            loop {
                interval.tick().await;
                match self.check_and_update().await {
                    Ok(UpdateOutcome::Fresh { .. }) => {}
                    Ok(UpdateOutcome::Updated { generation }) => {
                        info!(generation, "Timetable refreshed");
                    }
                    Err(UpdateError::Metadata { message }) => {
                        warn!(%message, "Cannot check feed validity");
                    }
                    Err(e) => error!(error = %e, "Feed update failed"),
                }
            }
        }))
    }

    async fn read_metadata(&self) -> Result<FeedMetadata, UpdateError> {
        let path = self.config.data_dir.join(METADATA_FILE);
        let xml = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| UpdateError::Io { path, source })?;
        FeedMetadata::parse(&xml)
    }

    async fn download_locked(&self) -> Result<u64, UpdateError> {
        let client = self.client.as_ref().ok_or(UpdateError::NoSource)?;
        let zip_path = self.config.data_dir.join(DOWNLOAD_FILE);
        client.download(&zip_path).await?;
        self.install_locked(zip_path, true).await
    }

    async fn install_locked(&self, zip_path: PathBuf, remove_zip: bool) -> Result<u64, UpdateError> {
        let data_dir = self.config.data_dir.clone();
        let store = self.store.clone();

        let (index, info) = tokio::task::spawn_blocking(move || {
            let staging = data_dir.join(STAGING_DIR);
            let staged = stage_archive(&zip_path, &staging);
            if remove_zip {
                let _ = std::fs::remove_file(&zip_path);
            }
            let feed = match staged {
                Ok(feed) => feed,
                Err(e) => {
                    let _ = std::fs::remove_dir_all(&staging);
                    return Err(e);
                }
            };

            promote_staged(&staging, &data_dir)?;
            record_import(&store, &feed, &data_dir)?;
            let index = build_index(&feed);
            let info = read_info(&store)?;
            Ok::<_, UpdateError>((index, info))
        })
        .await??;

        let generation = self.handle.publish(index);
        *self.info.write().await = info;
        info!(generation, "Published new timetable index");
        Ok(generation)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse the GTFS files in `data_dir` and replace the stored snapshot.
fn import_from_disk(store: &SnapshotStore, data_dir: &Path) -> Result<Feed, UpdateError> {
    let feed = load_feed(data_dir)?;
    record_import(store, &feed, data_dir)?;
    Ok(feed)
}

/// Replace the stored snapshot with `feed`.
/// Records the feed's `ValidTo` when `metadata.xml` is readable.
fn record_import(store: &SnapshotStore, feed: &Feed, data_dir: &Path) -> Result<(), UpdateError> {
    store.import(feed)?;

    match FeedMetadata::read(&data_dir.join(METADATA_FILE)).and_then(|m| m.valid_to_date()) {
        Ok(valid_to) => store.set_meta(VALID_TO_KEY, &valid_to.format("%Y-%m-%d").to_string())?,
        Err(e) => warn!(error = %e, "Feed metadata unavailable"),
    }
    Ok(())
}

/// Unpack `zip_path` into a fresh `staging` directory and parse it there.
fn stage_archive(zip_path: &Path, staging: &Path) -> Result<Feed, UpdateError> {
    match std::fs::remove_dir_all(staging) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(UpdateError::Io {
                path: staging.to_path_buf(),
                source,
            });
        }
    }
    extract_archive(zip_path, staging)?;
    Ok(load_feed(staging)?)
}

/// Move every entry of `staging` into `data_dir`, replacing existing ones,
/// then remove the empty staging directory.
fn promote_staged(staging: &Path, data_dir: &Path) -> Result<(), UpdateError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| UpdateError::Io { path, source }
    };

    for entry in std::fs::read_dir(staging).map_err(io_err(staging))? {
        let entry = entry.map_err(io_err(staging))?;
        let target = data_dir.join(entry.file_name());
        if target.is_dir() {
            std::fs::remove_dir_all(&target).map_err(io_err(&target))?;
        }
        std::fs::rename(entry.path(), &target).map_err(io_err(&target))?;
    }
    std::fs::remove_dir(staging).map_err(io_err(staging))
}

fn build_index(feed: &Feed) -> TimetableIndex {
    let index = TimetableIndex::build(feed);
    info!(
        stations = index.station_count(),
        trips = index.trip_count(),
        routes = index.route_count(),
        "Index built"
    );
    index
}

fn read_info(store: &SnapshotStore) -> Result<FeedInfo, UpdateError> {
    Ok(FeedInfo {
        imported_at: store.imported_at()?,
        valid_to: store.meta(VALID_TO_KEY)?,
    })
}
