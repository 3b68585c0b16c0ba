//! Caching layer for query results.
//!
//! Connection lists and departure boards are cached per index generation,
//! so entries computed against an older index are never served after a
//! new one is published; they simply age out.
//!
//! Keys carry the exact start second, so a cached answer is always the
//! answer the index would give for that request.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache as MokaCache;

use crate::timetable::{Connection, DepartureInfo, Published};

/// (generation, from station, to station, date, start secs, window mins)
type ConnectionKey = (u64, String, String, NaiveDate, u32, u32);

/// (generation, station, date, start secs, window mins)
type BoardKey = (u64, String, NaiveDate, u32, u32);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per query kind.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

/// Cache for connection and departure board queries.
pub struct QueryCache {
    connections: MokaCache<ConnectionKey, Arc<Vec<Connection>>>,
    boards: MokaCache<BoardKey, Arc<Vec<DepartureInfo>>>,
}

impl QueryCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            connections: MokaCache::builder()
                .time_to_live(config.ttl)
                .max_capacity(config.max_capacity)
                .build(),
            boards: MokaCache::builder()
                .time_to_live(config.ttl)
                .max_capacity(config.max_capacity)
                .build(),
        }
    }

    /// Direct connections, computed on `published` when not cached.
    pub async fn connections(
        &self,
        published: &Published,
        from_station: &str,
        to_station: &str,
        current_secs: u32,
        window_mins: u32,
        date: NaiveDate,
    ) -> Arc<Vec<Connection>> {
        let key = (
            published.generation,
            from_station.to_string(),
            to_station.to_string(),
            date,
            current_secs,
            window_mins,
        );
        let index = Arc::clone(&published.index);
        self.connections
            .get_with(key, async move {
                Arc::new(index.find_connections(
                    from_station,
                    to_station,
                    current_secs,
                    window_mins,
                    date,
                ))
            })
            .await
    }

    /// Departure board, computed on `published` when not cached.
    pub async fn departures(
        &self,
        published: &Published,
        station: &str,
        current_secs: u32,
        window_mins: u32,
        date: NaiveDate,
    ) -> Arc<Vec<DepartureInfo>> {
        let key = (
            published.generation,
            station.to_string(),
            date,
            current_secs,
            window_mins,
        );
        let index = Arc::clone(&published.index);
        self.boards
            .get_with(key, async move {
                Arc::new(index.departure_board(station, current_secs, window_mins, date))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs::{Calendar, Feed, LOCATION_TYPE_STATION, Stop, StopTime, Trip};
    use crate::timetable::{IndexHandle, TimetableIndex};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn index(departure: u32) -> TimetableIndex {
        let stop = |id: &str, parent: &str, location_type| Stop {
            id: id.into(),
            name: id.into(),
            location_type,
            parent_station: parent.into(),
            ..Default::default()
        };
        let call = |stop: &str, seq, time| StopTime {
            trip_id: "T1".into(),
            stop_id: stop.into(),
            arrival_time: time,
            departure_time: time,
            stop_sequence: seq,
        };
        TimetableIndex::build(&Feed {
            stops: vec![
                stop("S1", "", LOCATION_TYPE_STATION),
                stop("P1", "S1", 0),
                stop("S2", "", LOCATION_TYPE_STATION),
                stop("P2", "S2", 0),
            ],
            trips: vec![Trip {
                id: "T1".into(),
                route_id: "R1".into(),
                service_id: "EVERY".into(),
                ..Default::default()
            }],
            stop_times: vec![call("P1", 1, departure), call("P2", 2, departure + 600)],
            calendars: vec![Calendar {
                service_id: "EVERY".into(),
                monday: true,
                start_date: "20240101".into(),
                end_date: "20241231".into(),
                ..Default::default()
            }],
            ..Default::default()
        })
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.max_capacity, 1000);
    }

    #[tokio::test]
    async fn caches_per_query() {
        let cache = QueryCache::new(&CacheConfig::default());
        let handle = IndexHandle::new(index(28800));
        let published = handle.snapshot();

        let first = cache
            .connections(&published, "S1", "S2", 28800, 30, date())
            .await;
        let second = cache
            .connections(&published, "S1", "S2", 28800, 30, date())
            .await;

        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));

        let board = cache.departures(&published, "S1", 28800, 30, date()).await;
        assert_eq!(board.len(), 1);
    }

    #[tokio::test]
    async fn seconds_past_a_departure_exclude_it() {
        let cache = QueryCache::new(&CacheConfig::default());
        let handle = IndexHandle::new(index(28800));
        let published = handle.snapshot();

        // Warm an entry at the departure second
        let on_time = cache.departures(&published, "S1", 28800, 0, date()).await;
        assert_eq!(on_time.len(), 1);

        let late_board = cache.departures(&published, "S1", 28830, 0, date()).await;
        let late_connections = cache
            .connections(&published, "S1", "S2", 28830, 30, date())
            .await;

        assert!(late_board.is_empty());
        assert!(late_connections.is_empty());
        assert_eq!(
            *late_board,
            published.index.departure_board("S1", 28830, 0, date())
        );
    }

    #[tokio::test]
    async fn new_generation_is_not_served_stale_results() {
        let cache = QueryCache::new(&CacheConfig::default());
        let handle = IndexHandle::new(index(28800));

        let old = cache
            .departures(&handle.snapshot(), "S1", 28800, 0, date())
            .await;
        assert_eq!(old.len(), 1);

        // New index moves the departure out of the zero-width window
        handle.publish(index(29000));
        let new = cache
            .departures(&handle.snapshot(), "S1", 28800, 0, date())
            .await;
        assert!(new.is_empty());
    }

    #[tokio::test]
    async fn window_is_part_of_the_key() {
        let cache = QueryCache::new(&CacheConfig::default());
        let handle = IndexHandle::new(index(28800 + 1800));
        let published = handle.snapshot();

        let short = cache.departures(&published, "S1", 28800, 10, date()).await;
        let long = cache.departures(&published, "S1", 28800, 60, date()).await;

        assert!(short.is_empty());
        assert_eq!(long.len(), 1);
    }
}
