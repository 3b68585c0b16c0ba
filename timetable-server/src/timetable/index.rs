//! The immutable timetable index.
//!
//! Built once from a [`Feed`] through [`IndexBuilder`], then sealed into a
//! [`TimetableIndex`] that exposes only read access. Query algorithms
//! depend on the sort order established when sealing: each platform's
//! departures ascend by time, each trip's stops ascend by sequence.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::gtfs::{Calendar, CalendarDate, Feed, Route, Stop, StopTime, Trip};

use super::calendar::{ActiveServices, active_services};
use super::stations::{self, Station};

/// Position of a trip in the index's trip table.
///
/// Only the index hands these out, so every value is in range for the
/// index that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TripIdx(pub(crate) u32);

/// A trip leaving a platform: the per-platform view of a stop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    pub trip: TripIdx,
    pub departure_time: u32,
    pub stop_sequence: u32,
}

/// A call of a trip at a stop: the per-trip view of a stop time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripStop {
    pub stop_id: String,
    pub arrival_time: u32,
    pub departure_time: u32,
    pub stop_sequence: u32,
}

/// Trip metadata with its ordered calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripEntry {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: String,
    pub stops: Vec<TripStop>,
}

/// Route metadata needed for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub short_name: String,
    pub route_type: i32,
}

/// Accumulates lookup structures from feed records.
///
/// Steps run in the order of [`TimetableIndex::build`]; nothing is sorted
/// until [`IndexBuilder::seal`].
#[derive(Debug, Default)]
pub struct IndexBuilder {
    routes: HashMap<String, RouteEntry>,
    trips: Vec<TripEntry>,
    trip_lookup: HashMap<String, TripIdx>,
    stop_names: HashMap<String, String>,
    stations: Vec<Station>,
    station_platforms: HashMap<String, Vec<String>>,
    stop_departures: HashMap<String, Vec<Departure>>,
    calendars: Vec<Calendar>,
    calendar_dates: Vec<CalendarDate>,
    orphan_stop_times: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record route display metadata.
    pub fn add_routes(&mut self, routes: &[Route]) -> &mut Self {
        for route in routes {
            self.routes.insert(
                route.id.clone(),
                RouteEntry {
                    short_name: route.short_name.clone(),
                    route_type: route.route_type,
                },
            );
        }
        self
    }

    /// Record trip metadata. A repeated trip id replaces the earlier row.
    pub fn add_trips(&mut self, trips: &[Trip]) -> &mut Self {
        for trip in trips {
            let entry = TripEntry {
                id: trip.id.clone(),
                route_id: trip.route_id.clone(),
                service_id: trip.service_id.clone(),
                headsign: trip.headsign.clone(),
                stops: Vec::new(),
            };
            match self.trip_lookup.get(&trip.id) {
                Some(idx) => self.trips[idx.0 as usize] = entry,
                None => {
                    let idx = TripIdx(self.trips.len() as u32);
                    self.trip_lookup.insert(trip.id.clone(), idx);
                    self.trips.push(entry);
                }
            }
        }
        self
    }

    /// Record stop names, stations and station → platform links.
    pub fn add_stops(&mut self, stops: &[Stop]) -> &mut Self {
        for stop in stops {
            self.stop_names.insert(stop.id.clone(), stop.name.clone());
            if stop.is_station() {
                self.stations.push(Station::new(&stop.id, &stop.name));
            }
            if let Some(parent) = stop.parent() {
                self.station_platforms
                    .entry(parent.to_string())
                    .or_default()
                    .push(stop.id.clone());
            }
        }
        self
    }

    /// Project stop times onto platforms and trips.
    ///
    /// Stop times whose trip is unknown carry no service id and can never
    /// be active, so they are counted and dropped.
    pub fn add_stop_times(&mut self, stop_times: &[StopTime]) -> &mut Self {
        for st in stop_times {
            let Some(&trip) = self.trip_lookup.get(&st.trip_id) else {
                self.orphan_stop_times += 1;
                continue;
            };
            self.stop_departures
                .entry(st.stop_id.clone())
                .or_default()
                .push(Departure {
                    trip,
                    departure_time: st.departure_time,
                    stop_sequence: st.stop_sequence,
                });
            self.trips[trip.0 as usize].stops.push(TripStop {
                stop_id: st.stop_id.clone(),
                arrival_time: st.arrival_time,
                departure_time: st.departure_time,
                stop_sequence: st.stop_sequence,
            });
        }
        self
    }

    /// Keep the calendar tables for per-query resolution.
    pub fn add_calendars(
        &mut self,
        calendars: &[Calendar],
        calendar_dates: &[CalendarDate],
    ) -> &mut Self {
        self.calendars.extend_from_slice(calendars);
        self.calendar_dates.extend_from_slice(calendar_dates);
        self
    }

    /// Number of stop times dropped for referencing unknown trips.
    pub fn orphan_stop_times(&self) -> usize {
        self.orphan_stop_times
    }

    /// Sort every list the queries binary-search or scan, and freeze.
    pub fn seal(mut self) -> TimetableIndex {
        // Stable sorts keep input order among equal keys
        self.stations.sort_by(|a, b| a.name.cmp(&b.name));
        for departures in self.stop_departures.values_mut() {
            departures.sort_by_key(|d| d.departure_time);
        }
        for trip in &mut self.trips {
            trip.stops.sort_by_key(|s| s.stop_sequence);
        }

        TimetableIndex {
            routes: self.routes,
            trips: self.trips,
            trip_lookup: self.trip_lookup,
            stop_names: self.stop_names,
            stations: self.stations,
            station_platforms: self.station_platforms,
            stop_departures: self.stop_departures,
            calendars: self.calendars,
            calendar_dates: self.calendar_dates,
        }
    }
}

/// Read-only lookup structures for one feed generation.
#[derive(Debug)]
pub struct TimetableIndex {
    routes: HashMap<String, RouteEntry>,
    trips: Vec<TripEntry>,
    trip_lookup: HashMap<String, TripIdx>,
    stop_names: HashMap<String, String>,
    /// Sorted by display name.
    stations: Vec<Station>,
    station_platforms: HashMap<String, Vec<String>>,
    /// Each list sorted ascending by departure time.
    stop_departures: HashMap<String, Vec<Departure>>,
    calendars: Vec<Calendar>,
    calendar_dates: Vec<CalendarDate>,
}

impl TimetableIndex {
    /// Build an index from a feed snapshot.
    pub fn build(feed: &Feed) -> Self {
        let mut builder = IndexBuilder::new();
        builder
            .add_routes(&feed.routes)
            .add_trips(&feed.trips)
            .add_stops(&feed.stops)
            .add_stop_times(&feed.stop_times)
            .add_calendars(&feed.calendars, &feed.calendar_dates);

        if builder.orphan_stop_times() > 0 {
            tracing::warn!(
                count = builder.orphan_stop_times(),
                "Dropped stop times referencing unknown trips"
            );
        }

        builder.seal()
    }

    /// Service ids running on `date`.
    pub fn active_services(&self, date: NaiveDate) -> ActiveServices {
        active_services(&self.calendars, &self.calendar_dates, date)
    }

    /// Platform ids belonging to a station, in feed order. Unknown ids have none.
    pub fn platforms(&self, station_id: &str) -> &[String] {
        self.station_platforms
            .get(station_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Departures from a platform, ascending by time.
    pub fn departures_at(&self, stop_id: &str) -> &[Departure] {
        self.stop_departures
            .get(stop_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Trip by table position.
    pub fn trip(&self, idx: TripIdx) -> &TripEntry {
        &self.trips[idx.0 as usize]
    }

    /// Trip by feed id.
    pub fn trip_by_id(&self, trip_id: &str) -> Option<&TripEntry> {
        self.trip_lookup.get(trip_id).map(|&idx| self.trip(idx))
    }

    /// Route metadata by id.
    pub fn route(&self, route_id: &str) -> Option<&RouteEntry> {
        self.routes.get(route_id)
    }

    /// Display name of any stop or station.
    pub fn stop_name(&self, stop_id: &str) -> Option<&str> {
        self.stop_names.get(stop_id).map(String::as_str)
    }

    /// All stations, sorted by display name.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Up to ten stations whose names contain `query`, ignoring case and
    /// diacritics. An empty query matches nothing.
    pub fn search_stations(&self, query: &str) -> Vec<&Station> {
        stations::search(&self.stations, query)
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}
