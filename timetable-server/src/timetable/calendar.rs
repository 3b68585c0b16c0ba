//! Service calendar resolution.
//!
//! Implements the GTFS `calendar.txt` weekly patterns with
//! `calendar_dates.txt` exceptions layered on top.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::gtfs::{Calendar, CalendarDate};

/// Exception type adding a service on a date.
const EXCEPTION_ADDED: i32 = 1;

/// Exception type removing a service on a date.
const EXCEPTION_REMOVED: i32 = 2;

/// Service ids running on one concrete date.
pub type ActiveServices = HashSet<String>;

/// Compute the set of service ids active on `date`.
///
/// A calendar row contributes when `date` lies within its inclusive
/// `[start_date, end_date]` range and its flag for the weekday is set.
/// Exceptions for exactly `date` are applied afterwards: type 1 adds the
/// service even if no calendar row matches, type 2 removes it (removing an
/// absent service is a no-op). Rows whose date strings are not `YYYYMMDD`
/// never contribute.
pub fn active_services(
    calendars: &[Calendar],
    calendar_dates: &[CalendarDate],
    date: NaiveDate,
) -> ActiveServices {
    let key = date_key(date);
    let weekday = date.weekday();
    let mut active = ActiveServices::new();

    for cal in calendars {
        if !is_date_key(&cal.start_date) || !is_date_key(&cal.end_date) {
            continue;
        }
        // Fixed-width digit strings compare the same as the dates they encode
        if key.as_str() < cal.start_date.as_str() || key.as_str() > cal.end_date.as_str() {
            continue;
        }
        if runs_on_weekday(cal, weekday) {
            active.insert(cal.service_id.clone());
        }
    }

    for exception in calendar_dates.iter().filter(|cd| cd.date == key) {
        match exception.exception_type {
            EXCEPTION_ADDED => {
                active.insert(exception.service_id.clone());
            }
            EXCEPTION_REMOVED => {
                active.remove(&exception.service_id);
            }
            _ => {}
        }
    }

    active
}

/// Format a date the way GTFS calendar files do.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Whether `s` is an 8-digit `YYYYMMDD` string.
fn is_date_key(s: &str) -> bool {
    s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit())
}

fn runs_on_weekday(cal: &Calendar, weekday: Weekday) -> bool {
    match weekday {
        Weekday::Mon => cal.monday,
        Weekday::Tue => cal.tuesday,
        Weekday::Wed => cal.wednesday,
        Weekday::Thu => cal.thursday,
        Weekday::Fri => cal.friday,
        Weekday::Sat => cal.saturday,
        Weekday::Sun => cal.sunday,
    }
}
