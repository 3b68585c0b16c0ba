//! Askama templates for the web frontend.

use askama::Template;

use crate::gtfs::{format_duration, format_time};
use crate::timetable::{Connection, DepartureInfo};

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Home page with the connection and board search forms.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// Whether to link the live board.
    pub live_enabled: bool,
}

/// Live board page; reloads its data fragment periodically.
#[derive(Template)]
#[template(path = "liveboard.html")]
pub struct LiveBoardTemplate {
    pub from_name: String,
    pub to_name: String,
}

// ============================================================================
// Fragment Templates (AJAX responses, no base.html)
// ============================================================================

/// Connection search results fragment.
#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
    pub from_name: String,
    pub to_name: String,
    pub connections: Vec<ConnectionView>,
}

/// Departure board fragment.
#[derive(Template)]
#[template(path = "departures.html")]
pub struct DeparturesTemplate {
    pub station_name: String,
    pub departures: Vec<DepartureView>,
}

/// Live board data fragment.
#[derive(Template)]
#[template(path = "liveboard_data.html")]
pub struct LiveBoardDataTemplate {
    pub connections: Vec<ConnectionView>,
    /// Wall-clock time of the refresh (HH:MM:SS).
    pub updated_at: String,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// Icon name for a GTFS route type. Only trams get their own icon.
pub fn mode_icon(route_type: i32) -> &'static str {
    match route_type {
        0 => "tram",
        _ => "bus",
    }
}

/// Connection view model for templates.
#[derive(Debug, Clone)]
pub struct ConnectionView {
    pub line: String,
    pub mode_icon: &'static str,
    pub headsign: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub from_stop: String,
    pub to_stop: String,
}

impl ConnectionView {
    /// Create from a search result.
    pub fn from_connection(c: &Connection) -> Self {
        Self {
            line: c.line.clone(),
            mode_icon: mode_icon(c.route_type),
            headsign: c.headsign.clone(),
            departure: format_time(c.departure_time),
            arrival: format_time(c.arrival_time),
            duration: format_duration(c.duration),
            from_stop: c.from_stop.clone(),
            to_stop: c.to_stop.clone(),
        }
    }
}

/// Departure view model for templates.
#[derive(Debug, Clone)]
pub struct DepartureView {
    pub line: String,
    pub mode_icon: &'static str,
    pub headsign: String,
    pub departure: String,
    pub stop_name: String,
}

impl DepartureView {
    /// Create from a board entry.
    pub fn from_departure(d: &DepartureInfo) -> Self {
        Self {
            line: d.line.clone(),
            mode_icon: mode_icon(d.route_type),
            headsign: d.headsign.clone(),
            departure: format_time(d.departure_time),
            stop_name: d.stop_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> Connection {
        Connection {
            trip_id: "T1".into(),
            line: "22".into(),
            route_type: 0,
            headsign: "Bílá Hora".into(),
            departure_time: 8 * 3600 + 5 * 60,
            arrival_time: 8 * 3600 + 17 * 60,
            duration: 12 * 60,
            from_stop: "Národní třída".into(),
            to_stop: "Malostranská".into(),
        }
    }

    #[test]
    fn mode_icons() {
        assert_eq!(mode_icon(0), "tram");
        assert_eq!(mode_icon(3), "bus");
        assert_eq!(mode_icon(1), "bus");
    }

    #[test]
    fn connection_view_formats() {
        let view = ConnectionView::from_connection(&connection());

        assert_eq!(view.departure, "08:05");
        assert_eq!(view.arrival, "08:17");
        assert_eq!(view.duration, "12 min");
        assert_eq!(view.mode_icon, "tram");
    }

    #[test]
    fn results_render_connections() {
        let template = ResultsTemplate {
            from_name: "Národní třída".into(),
            to_name: "Malostranská".into(),
            connections: vec![ConnectionView::from_connection(&connection())],
        };

        let html = template.render().unwrap();

        assert!(html.contains("08:05"));
        assert!(html.contains("Bílá Hora"));
        assert!(html.contains("12 min"));
    }

    #[test]
    fn empty_board_renders_notice() {
        let template = DeparturesTemplate {
            station_name: "Anděl".into(),
            departures: vec![],
        };

        let html = template.render().unwrap();
        assert!(html.contains("No departures"));
    }
}
