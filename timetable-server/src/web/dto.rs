//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::gtfs::{format_time, SECS_PER_DAY};
use crate::timetable::{Connection, DepartureInfo, Station};

/// Station autocomplete request.
#[derive(Debug, Deserialize)]
pub struct StopSearchRequest {
    /// Partial station name
    #[serde(default)]
    pub q: String,
}

/// A station in autocomplete results.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StopResult {
    pub id: String,
    pub name: String,
}

impl From<&Station> for StopResult {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
        }
    }
}

/// Request for direct connections between two stations.
///
/// Time, date and window are kept as text so that malformed values fall
/// back to defaults instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct ConnectionSearchRequest {
    /// Origin station id
    pub from: String,

    /// Destination station id
    pub to: String,

    /// Start time in HH:MM format (defaults to now)
    pub time: Option<String>,

    /// Date in YYYY-MM-DD format (defaults to today)
    pub date: Option<String>,

    /// Window length in minutes
    pub window: Option<String>,
}

/// Request for a station's departure board.
#[derive(Debug, Deserialize)]
pub struct DepartureBoardRequest {
    /// Station id
    pub station: String,

    /// Start time in HH:MM format (defaults to now)
    pub time: Option<String>,

    /// Date in YYYY-MM-DD format (defaults to today)
    pub date: Option<String>,

    /// Window length in minutes
    pub window: Option<String>,
}

/// A direct connection in search results.
#[derive(Debug, Serialize)]
pub struct ConnectionResult {
    pub trip_id: String,
    pub line: String,
    pub route_type: i32,
    pub headsign: String,

    /// Departure time (HH:MM)
    pub departure: String,

    /// Arrival time (HH:MM)
    pub arrival: String,

    /// Departure in seconds since midnight of the query day
    pub departure_secs: u32,

    /// Arrival in seconds since midnight of the query day; may exceed a day
    pub arrival_secs: u32,

    /// Travel time in seconds
    pub duration_secs: u32,

    /// Boarding platform name
    pub from_stop: String,

    /// Alighting platform name
    pub to_stop: String,
}

impl From<&Connection> for ConnectionResult {
    fn from(c: &Connection) -> Self {
        Self {
            trip_id: c.trip_id.clone(),
            line: c.line.clone(),
            route_type: c.route_type,
            headsign: c.headsign.clone(),
            departure: format_time(c.departure_time),
            arrival: format_time(c.arrival_time),
            departure_secs: c.departure_time,
            arrival_secs: c.arrival_time,
            duration_secs: c.duration,
            from_stop: c.from_stop.clone(),
            to_stop: c.to_stop.clone(),
        }
    }
}

/// Response to a connection search.
#[derive(Debug, Serialize)]
pub struct ConnectionSearchResponse {
    pub from_name: String,
    pub to_name: String,
    pub count: usize,
    pub connections: Vec<ConnectionResult>,
}

/// A departure on a station board.
#[derive(Debug, Serialize)]
pub struct DepartureResult {
    pub trip_id: String,
    pub line: String,
    pub route_type: i32,
    pub headsign: String,

    /// Departure time (HH:MM)
    pub departure: String,

    /// Departure in seconds since midnight of the query day
    pub departure_secs: u32,

    /// Platform name
    pub stop_name: String,

    /// Whether the departure falls on the following calendar day
    pub next_day: bool,
}

impl From<&DepartureInfo> for DepartureResult {
    fn from(d: &DepartureInfo) -> Self {
        Self {
            trip_id: d.trip_id.clone(),
            line: d.line.clone(),
            route_type: d.route_type,
            headsign: d.headsign.clone(),
            departure: format_time(d.departure_time),
            departure_secs: d.departure_time,
            stop_name: d.stop_name.clone(),
            next_day: d.departure_time >= SECS_PER_DAY,
        }
    }
}

/// Response with a departure board.
#[derive(Debug, Serialize)]
pub struct DepartureBoardResponse {
    pub station_name: String,
    pub count: usize,
    pub departures: Vec<DepartureResult>,
}

/// Service status.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub stations: usize,
    pub trips: usize,
    pub routes: usize,

    /// Generation number of the served index
    pub generation: u64,

    /// When the served feed was imported (RFC 3339)
    pub imported_at: Option<String>,

    /// Last day the served feed is valid (YYYY-MM-DD)
    pub valid_to: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_result_formats_times() {
        let connection = Connection {
            trip_id: "T1".into(),
            line: "22".into(),
            route_type: 0,
            headsign: "Bílá Hora".into(),
            departure_time: 28800,
            arrival_time: 86400 + 600,
            duration: 86400 + 600 - 28800,
            from_stop: "Anděl A".into(),
            to_stop: "Zličín B".into(),
        };

        let result = ConnectionResult::from(&connection);

        assert_eq!(result.departure, "08:00");
        assert_eq!(result.arrival, "00:10");
        assert_eq!(result.arrival_secs, 87000);
        assert_eq!(result.from_stop, "Anděl A");
    }

    #[test]
    fn departure_result_serializes() {
        let departure = DepartureInfo {
            trip_id: "T1".into(),
            line: "9".into(),
            route_type: 0,
            headsign: "Spojovací".into(),
            departure_time: 3600,
            stop_name: "Anděl A".into(),
        };

        let json = serde_json::to_value(DepartureResult::from(&departure)).unwrap();

        assert_eq!(json["departure"], "01:00");
        assert_eq!(json["line"], "9");
        assert_eq!(json["next_day"], false);
    }

    #[test]
    fn stop_search_request_defaults_query() {
        let req: StopSearchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.q, "");
    }
}
