//! Departure board for a single station.

use chrono::NaiveDate;

use super::index::TimetableIndex;
use super::scan::{TimeShift, plan_passes, scan_platform};

/// One departure shown on a station board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureInfo {
    pub trip_id: String,
    pub line: String,
    pub route_type: i32,
    pub headsign: String,
    /// Seconds since midnight of the query day.
    pub departure_time: u32,
    /// Platform name.
    pub stop_name: String,
}

impl TimeShift for DepartureInfo {
    fn shift_back(&mut self, secs: u32) {
        self.departure_time = self.departure_time.saturating_sub(secs);
    }
}

impl TimetableIndex {
    /// Every departure from any platform of `station_id` within
    /// `window_mins` minutes of `current_secs` on `date`, ascending by
    /// departure time. Both ends of the window are inclusive.
    pub fn departure_board(
        &self,
        station_id: &str,
        current_secs: u32,
        window_mins: u32,
        date: NaiveDate,
    ) -> Vec<DepartureInfo> {
        let platforms = self.platforms(station_id);
        if platforms.is_empty() {
            return Vec::new();
        }

        let mut board = Vec::new();
        for pass in plan_passes(self, current_secs, window_mins, date) {
            for platform in platforms {
                scan_platform(self, platform, &pass, &mut board, |departure, trip| {
                    let route = self.route(&trip.route_id);
                    Some(DepartureInfo {
                        trip_id: trip.id.clone(),
                        line: route.map(|r| r.short_name.clone()).unwrap_or_default(),
                        route_type: route.map(|r| r.route_type).unwrap_or_default(),
                        headsign: trip.headsign.clone(),
                        departure_time: departure.departure_time,
                        stop_name: self.stop_name(platform).unwrap_or_default().to_string(),
                    })
                });
            }
        }

        board.sort_by_key(|d| d.departure_time);
        board
    }
}
