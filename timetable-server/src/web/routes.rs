//! HTTP route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use tower_http::services::ServeDir;
use tracing::{debug, error, warn};

use crate::gtfs::seconds_of_day;
use crate::timetable::{QueryConfig, TimetableIndex};

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Window used by the live board (minutes).
const LIVE_WINDOW_MINS: u32 = 60;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/api/stops", get(search_stops))
        .route("/search", get(search_connections))
        .route("/departures", get(departure_board))
        .route("/live", get(live_page))
        .route("/live/data", get(live_data))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Service status with index statistics.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let published = state.handle.snapshot();
    let info = state.feed_info().await;

    Json(HealthResponse {
        status: "ok",
        stations: published.index.station_count(),
        trips: published.index.trip_count(),
        routes: published.index.route_count(),
        generation: published.generation,
        imported_at: info.imported_at.map(|t| t.to_rfc3339()),
        valid_to: info.valid_to,
    })
}

/// Index page with search forms.
async fn index_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let template = IndexTemplate {
        live_enabled: state.live_board.is_some(),
    };
    Ok(Html(template.render()?))
}

/// Station autocomplete.
async fn search_stops(
    State(state): State<AppState>,
    Query(req): Query<StopSearchRequest>,
) -> Json<Vec<StopResult>> {
    let index = state.handle.current();
    let stations = index
        .search_stations(&req.q)
        .into_iter()
        .map(StopResult::from)
        .collect();
    Json(stations)
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Start of a query: seconds since midnight and service date.
///
/// Missing or malformed values fall back to `now`.
fn resolve_moment(time: Option<&str>, date: Option<&str>, now: NaiveDateTime) -> (u32, NaiveDate) {
    let secs = time
        .and_then(|t| NaiveTime::parse_from_str(t.trim(), "%H:%M").ok())
        .map(seconds_of_day)
        .unwrap_or_else(|| seconds_of_day(now.time()));
    let date = date
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(|| now.date());
    (secs, date)
}

/// Window in minutes; malformed values count as missing.
fn resolve_window(window: Option<&str>, config: &QueryConfig) -> u32 {
    config.window_mins(window.and_then(|w| w.trim().parse().ok()))
}

/// Display name for a station id; unknown ids show as themselves.
fn station_name(index: &TimetableIndex, id: &str) -> String {
    index.stop_name(id).unwrap_or(id).to_string()
}

/// Direct connections between two stations.
async fn search_connections(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(req): Query<ConnectionSearchRequest>,
) -> Result<Response, AppError> {
    let (current_secs, date) =
        resolve_moment(req.time.as_deref(), req.date.as_deref(), Local::now().naive_local());
    let window = resolve_window(req.window.as_deref(), &state.query);

    let published = state.handle.snapshot();
    let connections = state
        .cache
        .connections(&published, &req.from, &req.to, current_secs, window, date)
        .await;
    debug!(
        from = %req.from,
        to = %req.to,
        %date,
        window,
        found = connections.len(),
        "Connection search"
    );

    let from_name = station_name(&published.index, &req.from);
    let to_name = station_name(&published.index, &req.to);

    // Return HTML or JSON based on Accept header
    if accepts_html(&headers) {
        let template = ResultsTemplate {
            from_name,
            to_name,
            connections: connections.iter().map(ConnectionView::from_connection).collect(),
        };
        Ok(Html(template.render()?).into_response())
    } else {
        Ok(Json(ConnectionSearchResponse {
            from_name,
            to_name,
            count: connections.len(),
            connections: connections.iter().map(ConnectionResult::from).collect(),
        })
        .into_response())
    }
}

/// Departure board for one station.
async fn departure_board(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(req): Query<DepartureBoardRequest>,
) -> Result<Response, AppError> {
    let (current_secs, date) =
        resolve_moment(req.time.as_deref(), req.date.as_deref(), Local::now().naive_local());
    let window = resolve_window(req.window.as_deref(), &state.query);

    let published = state.handle.snapshot();
    let departures = state
        .cache
        .departures(&published, &req.station, current_secs, window, date)
        .await;
    let station_name = station_name(&published.index, &req.station);

    if accepts_html(&headers) {
        let template = DeparturesTemplate {
            station_name,
            departures: departures.iter().map(DepartureView::from_departure).collect(),
        };
        Ok(Html(template.render()?).into_response())
    } else {
        Ok(Json(DepartureBoardResponse {
            station_name,
            count: departures.len(),
            departures: departures.iter().map(DepartureResult::from).collect(),
        })
        .into_response())
    }
}

/// Live board page for the configured station pair.
async fn live_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let live = state.live_board.as_ref().ok_or_else(live_not_configured)?;
    let index = state.handle.current();

    let template = LiveBoardTemplate {
        from_name: station_name(&index, &live.from_station),
        to_name: station_name(&index, &live.to_station),
    };
    Ok(Html(template.render()?))
}

/// Live board data fragment: the next hour of connections from now.
async fn live_data(State(state): State<AppState>) -> Result<Response, AppError> {
    let live = state.live_board.as_ref().ok_or_else(live_not_configured)?;
    let now = Local::now().naive_local();
    let (current_secs, date) = resolve_moment(None, None, now);

    let published = state.handle.snapshot();
    let connections = state
        .cache
        .connections(
            &published,
            &live.from_station,
            &live.to_station,
            current_secs,
            LIVE_WINDOW_MINS,
            date,
        )
        .await;

    let template = LiveBoardDataTemplate {
        connections: connections.iter().map(ConnectionView::from_connection).collect(),
        updated_at: now.format("%H:%M:%S").to_string(),
    };
    Ok(askama_axum::into_response(&template))
}

fn live_not_configured() -> AppError {
    AppError::NotFound {
        message: "live board is not configured".to_string(),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    Internal { message: String },
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Internal {
            message: format!("Template error: {}", e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        } else {
            warn!(%status, %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cache::CacheConfig;
    use crate::config::LiveBoardConfig;
    use crate::gtfs::{Feed, LOCATION_TYPE_STATION, Stop};
    use crate::timetable::IndexHandle;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(14, 30, 15)
            .unwrap()
    }

    fn state() -> AppState {
        let stop = |id: &str, name: &str| Stop {
            id: id.into(),
            name: name.into(),
            location_type: LOCATION_TYPE_STATION,
            ..Default::default()
        };
        let index = TimetableIndex::build(&Feed {
            stops: vec![stop("S1", "Anděl"), stop("S2", "Andělská hora")],
            ..Default::default()
        });
        AppState::new(
            Arc::new(IndexHandle::new(index)),
            QueryConfig::default(),
            &CacheConfig::default(),
        )
    }

    #[test]
    fn moment_from_query() {
        let (secs, date) = resolve_moment(Some("08:05"), Some("2024-12-24"), now());
        assert_eq!(secs, 8 * 3600 + 5 * 60);
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 12, 24).unwrap());
    }

    #[test]
    fn moment_falls_back_to_now() {
        let expected = (14 * 3600 + 30 * 60 + 15, now().date());
        assert_eq!(resolve_moment(None, None, now()), expected);
        assert_eq!(resolve_moment(Some("25:99"), Some("24.12.2024"), now()), expected);
        assert_eq!(resolve_moment(Some(""), Some(""), now()), expected);
    }

    #[test]
    fn window_fallbacks() {
        let config = QueryConfig::default();
        assert_eq!(resolve_window(None, &config), 60);
        assert_eq!(resolve_window(Some("abc"), &config), 60);
        assert_eq!(resolve_window(Some("-5"), &config), 60);
        assert_eq!(resolve_window(Some("0"), &config), 60);
        assert_eq!(resolve_window(Some("15"), &config), 15);
        assert_eq!(resolve_window(Some("100000"), &config), 1440);
    }

    #[test]
    fn html_detection() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_html(&headers));
        headers.insert(header::ACCEPT, "text/html,application/xhtml+xml".parse().unwrap());
        assert!(accepts_html(&headers));
    }

    #[tokio::test]
    async fn health_reports_index() {
        let Json(body) = health(State(state())).await;

        assert_eq!(body.status, "ok");
        assert_eq!(body.stations, 2);
        assert_eq!(body.trips, 0);
        assert_eq!(body.generation, 1);
        assert_eq!(body.imported_at, None);
    }

    #[tokio::test]
    async fn stops_autocomplete() {
        let Json(found) = search_stops(
            State(state()),
            Query(StopSearchRequest { q: "andel".into() }),
        )
        .await;

        assert_eq!(
            found,
            vec![
                StopResult {
                    id: "S1".into(),
                    name: "Anděl".into()
                },
                StopResult {
                    id: "S2".into(),
                    name: "Andělská hora".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn live_board_disabled_is_not_found() {
        let response = live_data(State(state())).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn live_page_names_configured_stations() {
        let state = state().with_live_board(LiveBoardConfig {
            from_station: "S1".into(),
            to_station: "S2".into(),
        });

        let Html(page) = live_page(State(state)).await.unwrap();

        assert!(page.contains("Anděl"));
        assert!(page.contains("Andělská hora"));
    }

    #[tokio::test]
    async fn unknown_station_board_is_empty_json() {
        let response = departure_board(
            State(state()),
            HeaderMap::new(),
            Query(DepartureBoardRequest {
                station: "NOPE".into(),
                time: None,
                date: None,
                window: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
