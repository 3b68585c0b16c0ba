use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use timetable_server::cache::CacheConfig;
use timetable_server::config::ServerConfig;
use timetable_server::updater::FeedUpdater;
use timetable_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    // Build the first index (fail fast if no feed is available)
    info!(data_dir = %config.data_dir.display(), "Loading timetable");
    let updater = match FeedUpdater::load_or_import(config.updater_config()).await {
        Ok(updater) => Arc::new(updater),
        Err(e) => {
            error!(error = %e, "Failed to load timetable data");
            std::process::exit(1);
        }
    };

    // Spawn background task checking feed validity
    Arc::clone(&updater).spawn_refresh_task();

    // Build app state
    let mut state = AppState::from_updater(updater, config.query.clone(), &CacheConfig::default());
    if let Some(live) = config.live_board.clone() {
        info!(from = %live.from_station, to = %live.to_station, "Live board enabled");
        state = state.with_live_board(live);
    }

    // Create router
    let app = create_router(state, &config.static_dir.to_string_lossy());

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("Failed to bind listen address");
    info!(addr = %config.listen_addr, "Timetable server listening");

    axum::serve(listener, app).await.expect("Server error");
}
