//! Raw GTFS records as read from a feed.
//!
//! These are plain data; the timetable index derives its lookup structures
//! from them and never mutates them.

use serde::{Deserialize, Serialize};

/// `location_type` value marking a stop as a station (parent of platforms).
pub const LOCATION_TYPE_STATION: i32 = 1;

/// A row of `stops.txt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub code: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub location_type: i32,
    /// Empty when the stop has no parent station.
    pub parent_station: String,
    pub wheelchair_boarding: i32,
}

impl Stop {
    /// Whether this stop is a station grouping platforms.
    pub fn is_station(&self) -> bool {
        self.location_type == LOCATION_TYPE_STATION
    }

    /// The parent station id, if any.
    pub fn parent(&self) -> Option<&str> {
        if self.parent_station.is_empty() {
            None
        } else {
            Some(&self.parent_station)
        }
    }
}

/// A row of `routes.txt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub agency_id: String,
    pub short_name: String,
    pub long_name: String,
    /// Transit mode: 0 = tram, 3 = bus, etc.
    pub route_type: i32,
}

/// A row of `trips.txt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: String,
    pub direction_id: i32,
    pub shape_id: String,
    pub wheelchair_accessible: i32,
}

/// A row of `calendar.txt`: a weekly pattern valid over a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub service_id: String,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    /// `YYYYMMDD`, inclusive.
    pub start_date: String,
    /// `YYYYMMDD`, inclusive.
    pub end_date: String,
}

/// A row of `calendar_dates.txt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub service_id: String,
    /// `YYYYMMDD`.
    pub date: String,
    /// 1 = service added, 2 = service removed.
    pub exception_type: i32,
}

/// A row of `stop_times.txt`.
///
/// Times are seconds since midnight of the trip's service day and may
/// exceed 86400 for service running past midnight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub arrival_time: u32,
    pub departure_time: u32,
    pub stop_sequence: u32,
}

/// A row of `transfers.txt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub transfer_type: i32,
    pub min_transfer_time: u32,
}

/// One complete feed snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub trips: Vec<Trip>,
    pub calendars: Vec<Calendar>,
    pub calendar_dates: Vec<CalendarDate>,
    pub stop_times: Vec<StopTime>,
    pub transfers: Vec<Transfer>,
}

impl Feed {
    /// Total number of records across all tables.
    pub fn record_count(&self) -> usize {
        self.stops.len()
            + self.routes.len()
            + self.trips.len()
            + self.calendars.len()
            + self.calendar_dates.len()
            + self.stop_times.len()
            + self.transfers.len()
    }
}
