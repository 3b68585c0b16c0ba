//! Direct connection search between two stations.

use std::collections::HashSet;

use chrono::NaiveDate;

use super::index::TimetableIndex;
use super::scan::{TimeShift, plan_passes, scan_platform};

/// One ride on a single trip from the origin station to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub trip_id: String,
    /// Route short name.
    pub line: String,
    pub route_type: i32,
    pub headsign: String,
    /// Seconds since midnight of the query day.
    pub departure_time: u32,
    /// Seconds since midnight of the query day.
    pub arrival_time: u32,
    /// Seconds between departure and arrival.
    pub duration: u32,
    /// Boarding platform name.
    pub from_stop: String,
    /// Alighting platform name.
    pub to_stop: String,
}

impl TimeShift for Connection {
    fn shift_back(&mut self, secs: u32) {
        self.departure_time = self.departure_time.saturating_sub(secs);
        self.arrival_time = self.arrival_time.saturating_sub(secs);
    }
}

impl TimetableIndex {
    /// Direct connections from `from_station` to `to_station` departing
    /// within `window_mins` minutes of `current_secs` on `date`, ascending
    /// by departure time.
    ///
    /// Each departure yields at most one connection: the trip's first stop
    /// after boarding that belongs to the destination station. A trip
    /// serving the destination twice is not reported twice. Departures of
    /// one trip seen from two origin platforms are not de-duplicated.
    ///
    /// Unknown stations produce an empty result.
    pub fn find_connections(
        &self,
        from_station: &str,
        to_station: &str,
        current_secs: u32,
        window_mins: u32,
        date: NaiveDate,
    ) -> Vec<Connection> {
        let origins = self.platforms(from_station);
        let destinations: HashSet<&str> = self
            .platforms(to_station)
            .iter()
            .map(String::as_str)
            .collect();
        if origins.is_empty() || destinations.is_empty() {
            return Vec::new();
        }

        let mut connections = Vec::new();
        for pass in plan_passes(self, current_secs, window_mins, date) {
            for platform in origins {
                scan_platform(self, platform, &pass, &mut connections, |departure, trip| {
                    let arrival = trip.stops.iter().find(|s| {
                        s.stop_sequence > departure.stop_sequence
                            && destinations.contains(s.stop_id.as_str())
                    })?;
                    let route = self.route(&trip.route_id);
                    Some(Connection {
                        trip_id: trip.id.clone(),
                        line: route.map(|r| r.short_name.clone()).unwrap_or_default(),
                        route_type: route.map(|r| r.route_type).unwrap_or_default(),
                        headsign: trip.headsign.clone(),
                        departure_time: departure.departure_time,
                        arrival_time: arrival.arrival_time,
                        duration: arrival.arrival_time.saturating_sub(departure.departure_time),
                        from_stop: self.stop_name(platform).unwrap_or_default().to_string(),
                        to_stop: self
                            .stop_name(&arrival.stop_id)
                            .unwrap_or_default()
                            .to_string(),
                    })
                });
            }
        }

        connections.sort_by_key(|c| c.departure_time);
        connections
    }
}
