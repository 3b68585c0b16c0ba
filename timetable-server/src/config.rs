//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::timetable::QueryConfig;
use crate::updater::UpdaterConfig;

/// Errors in the server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    /// Only one of a pair of variables is set
    #[error("{set} is set but {missing} is not")]
    Incomplete {
        set: &'static str,
        missing: &'static str,
    },
}

/// Fixed origin and destination shown on the live board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveBoardConfig {
    pub from_station: String,
    pub to_station: String,
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory of the unpacked GTFS files (`GTFS_DATA_DIR`).
    pub data_dir: PathBuf,
    /// Snapshot store directory (`STORE_DIR`).
    pub store_dir: PathBuf,
    /// Zipped feed URL for refreshes (`GTFS_SOURCE_URL`).
    pub source_url: Option<String>,
    /// Address to listen on (`LISTEN_ADDR`).
    pub listen_addr: SocketAddr,
    /// Directory served under `/static` (`STATIC_DIR`).
    pub static_dir: PathBuf,
    /// Time between validity checks (`REFRESH_INTERVAL_HOURS`).
    pub refresh_interval: Duration,
    /// Refresh once this few days remain (`REFRESH_THRESHOLD_DAYS`).
    pub threshold_days: i64,
    /// Live board pair (`LIVE_FROM_STATION`, `LIVE_TO_STATION`).
    pub live_board: Option<LiveBoardConfig>,
    pub query: QueryConfig,
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = PathBuf::from(get("GTFS_DATA_DIR").unwrap_or_else(|| "gtfs".to_string()));
        let store_dir = get("STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("store"));
        let listen_addr = parse(&get, "LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let static_dir = PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| "static".to_string()));
        let refresh_hours: u64 = parse(&get, "REFRESH_INTERVAL_HOURS", 24)?;
        if refresh_hours == 0 {
            return Err(ConfigError::Invalid {
                key: "REFRESH_INTERVAL_HOURS",
                value: "0".to_string(),
            });
        }
        let threshold_days = parse(&get, "REFRESH_THRESHOLD_DAYS", 3)?;

        let live_board = match (get("LIVE_FROM_STATION"), get("LIVE_TO_STATION")) {
            (Some(from_station), Some(to_station)) => Some(LiveBoardConfig {
                from_station,
                to_station,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    set: "LIVE_FROM_STATION",
                    missing: "LIVE_TO_STATION",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    set: "LIVE_TO_STATION",
                    missing: "LIVE_FROM_STATION",
                });
            }
        };

        Ok(Self {
            data_dir,
            store_dir,
            source_url: get("GTFS_SOURCE_URL"),
            listen_addr,
            static_dir,
            refresh_interval: Duration::from_secs(refresh_hours * 60 * 60),
            threshold_days,
            live_board,
            query: QueryConfig::default(),
        })
    }

    /// Settings for the feed updater.
    pub fn updater_config(&self) -> UpdaterConfig {
        let mut config = UpdaterConfig::new(&self.data_dir).with_store_dir(&self.store_dir);
        if let Some(url) = &self.source_url {
            config = config.with_source_url(url);
        }
        config.refresh_interval = self.refresh_interval;
        config.threshold_days = self.threshold_days;
        config
    }
}

/// Parse `key` if set, else return `default`.
fn parse<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
