//! GTFS feed records and the file loader that produces them.
//!
//! The timetable core only consumes [`Feed`] values; reading files is
//! confined to this module.

mod error;
mod loader;
mod model;
mod time;

pub use error::FeedError;
pub use loader::load_feed;
pub use model::{
    Calendar, CalendarDate, Feed, LOCATION_TYPE_STATION, Route, Stop, StopTime, Transfer, Trip,
};
pub use time::{
    SECS_PER_DAY, TimeError, format_duration, format_time, parse_gtfs_time, seconds_of_day,
};
