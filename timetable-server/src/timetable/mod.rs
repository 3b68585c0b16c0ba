//! In-memory timetable index and its queries.
//!
//! A [`TimetableIndex`] is built once per feed snapshot and never mutated
//! afterwards. It answers three questions:
//!
//! - which direct trips run from one station to another in a time window
//!   ([`TimetableIndex::find_connections`]),
//! - what leaves a station in a time window
//!   ([`TimetableIndex::departure_board`]),
//! - which stations match a typed name ([`TimetableIndex::search_stations`]).
//!
//! Service calendars are resolved per query date, and trips of the previous
//! service day running past midnight are included for early-morning
//! queries. [`IndexHandle`] swaps in a new index when the feed refreshes.

mod calendar;
mod config;
mod connections;
mod departures;
mod handle;
mod index;
mod scan;
mod stations;


pub use calendar::{ActiveServices, active_services, date_key};
pub use config::QueryConfig;
pub use connections::Connection;
pub use departures::DepartureInfo;
pub use handle::{IndexHandle, Published};
pub use index::{Departure, IndexBuilder, RouteEntry, TimetableIndex, TripEntry, TripIdx, TripStop};
pub use scan::OVERNIGHT_CUTOFF_SECS;
pub use stations::{MAX_STATION_RESULTS, Station, normalize_name};
