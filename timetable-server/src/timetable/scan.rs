//! Windowed departure scanning shared by connection search and the
//! departure board.
//!
//! A query runs up to two passes over each platform's sorted departures.
//! The first uses the query date's services and the query window as-is.
//! Early in the morning a second pass uses the previous day's services
//! with the window moved 24h later, because that day's late trips carry
//! times of 24:00:00 and beyond; its results are moved back by 24h.

use chrono::NaiveDate;

use crate::gtfs::SECS_PER_DAY;

use super::calendar::ActiveServices;
use super::index::{Departure, TimetableIndex, TripEntry};

/// Queries before this time of day also scan the previous service day.
pub const OVERNIGHT_CUTOFF_SECS: u32 = 4 * 3600;

/// A query result that can be moved back onto the query day's time scale.
pub(crate) trait TimeShift {
    fn shift_back(&mut self, secs: u32);
}

/// One scan over a closed time range with one active-service set.
#[derive(Debug)]
pub(crate) struct ScanPass {
    /// First departure time included.
    pub from: u32,
    /// Last departure time included.
    pub to: u32,
    pub active: ActiveServices,
    /// Subtracted from result times.
    pub shift: u32,
}

/// The passes a query at `current_secs` on `date` must run.
pub(crate) fn plan_passes(
    index: &TimetableIndex,
    current_secs: u32,
    window_mins: u32,
    date: NaiveDate,
) -> Vec<ScanPass> {
    let end = current_secs.saturating_add(window_mins.saturating_mul(60));
    let mut passes = vec![ScanPass {
        from: current_secs,
        to: end,
        active: index.active_services(date),
        shift: 0,
    }];

    if current_secs < OVERNIGHT_CUTOFF_SECS
        && let Some(previous) = date.pred_opt()
    {
        passes.push(ScanPass {
            from: current_secs.saturating_add(SECS_PER_DAY),
            to: end.saturating_add(SECS_PER_DAY),
            active: index.active_services(previous),
            shift: SECS_PER_DAY,
        });
    }

    passes
}

/// Departures with `from <= departure_time <= to`.
///
/// `departures` must be sorted ascending by departure time.
pub(crate) fn window(departures: &[Departure], from: u32, to: u32) -> &[Departure] {
    let start = departures.partition_point(|d| d.departure_time < from);
    let len = departures[start..].partition_point(|d| d.departure_time <= to);
    &departures[start..start + len]
}

/// Scan one platform for one pass.
///
/// Each departure in the window whose trip runs under the pass's active
/// services is handed to `project`; every value it returns is shifted by
/// the pass and appended to `out`.
pub(crate) fn scan_platform<T: TimeShift>(
    index: &TimetableIndex,
    platform_id: &str,
    pass: &ScanPass,
    out: &mut Vec<T>,
    mut project: impl FnMut(&Departure, &TripEntry) -> Option<T>,
) {
    for departure in window(index.departures_at(platform_id), pass.from, pass.to) {
        let trip = index.trip(departure.trip);
        if !pass.active.contains(&trip.service_id) {
            continue;
        }
        if let Some(mut item) = project(departure, trip) {
            if pass.shift > 0 {
                item.shift_back(pass.shift);
            }
            out.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::TripIdx;

    fn deps(times: &[u32]) -> Vec<Departure> {
        times
            .iter()
            .map(|&t| Departure {
                trip: TripIdx(0),
                departure_time: t,
                stop_sequence: 1,
            })
            .collect()
    }

    fn times(slice: &[Departure]) -> Vec<u32> {
        slice.iter().map(|d| d.departure_time).collect()
    }

    #[test]
    fn window_is_closed_on_both_ends() {
        let list = deps(&[100, 200, 200, 300, 400]);
        assert_eq!(times(window(&list, 200, 300)), vec![200, 200, 300]);
    }

    #[test]
    fn zero_width_window() {
        let list = deps(&[100, 200, 300]);
        assert_eq!(times(window(&list, 200, 200)), vec![200]);
        assert!(window(&list, 150, 150).is_empty());
    }

    #[test]
    fn window_outside_range() {
        let list = deps(&[100, 200]);
        assert!(window(&list, 300, 400).is_empty());
        assert!(window(&list, 0, 50).is_empty());
        assert!(window(&[], 0, 50).is_empty());
    }

    #[test]
    fn previous_day_pass_only_before_cutoff() {
        let index = TimetableIndex::build(&Default::default());
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        let early = plan_passes(&index, 3 * 3600, 30, date);
        assert_eq!(early.len(), 2);
        assert_eq!(early[1].from, 27 * 3600);
        assert_eq!(early[1].to, 27 * 3600 + 1800);
        assert_eq!(early[1].shift, SECS_PER_DAY);

        let late = plan_passes(&index, OVERNIGHT_CUTOFF_SECS, 30, date);
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].to, OVERNIGHT_CUTOFF_SECS + 1800);
    }
}
