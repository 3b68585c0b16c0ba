//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::{CacheConfig, QueryCache};
use crate::config::LiveBoardConfig;
use crate::timetable::{IndexHandle, QueryConfig};
use crate::updater::{FeedInfo, FeedUpdater};

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Currently served timetable index
    pub handle: Arc<IndexHandle>,

    /// Query result cache
    pub cache: Arc<QueryCache>,

    /// Query defaults and limits
    pub query: Arc<QueryConfig>,

    /// Fixed pair shown on the live board, if configured
    pub live_board: Option<Arc<LiveBoardConfig>>,

    /// Feed updater, for status reporting
    pub updater: Option<Arc<FeedUpdater>>,
}

impl AppState {
    /// Create a new app state serving `handle`.
    pub fn new(handle: Arc<IndexHandle>, query: QueryConfig, cache_config: &CacheConfig) -> Self {
        Self {
            handle,
            cache: Arc::new(QueryCache::new(cache_config)),
            query: Arc::new(query),
            live_board: None,
            updater: None,
        }
    }

    /// Create the state for a running updater, serving its index.
    pub fn from_updater(updater: Arc<FeedUpdater>, query: QueryConfig, cache_config: &CacheConfig) -> Self {
        let mut state = Self::new(updater.handle(), query, cache_config);
        state.updater = Some(updater);
        state
    }

    /// Enable the live board for a station pair.
    pub fn with_live_board(mut self, live_board: LiveBoardConfig) -> Self {
        self.live_board = Some(Arc::new(live_board));
        self
    }

    /// Facts about the served feed; empty without an updater.
    pub async fn feed_info(&self) -> FeedInfo {
        match &self.updater {
            Some(updater) => updater.feed_info().await,
            None => FeedInfo::default(),
        }
    }
}
