//! Reads a directory of GTFS text files into a [`Feed`].

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use tracing::{debug, info, warn};

use super::error::FeedError;
use super::model::{Calendar, CalendarDate, Feed, Route, Stop, StopTime, Transfer, Trip};
use super::time::parse_gtfs_time;

/// One CSV record with column lookup by header name.
struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    /// Text of a column, or "" when absent.
    fn str(&self, name: &str) -> &str {
        self.columns
            .get(name)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }

    fn string(&self, name: &str) -> String {
        self.str(name).to_string()
    }

    /// Integer column; absent or unparseable values read as zero.
    fn int<T: std::str::FromStr + Default>(&self, name: &str) -> T {
        self.str(name).parse().unwrap_or_default()
    }

    fn float(&self, name: &str) -> f64 {
        self.str(name).parse().unwrap_or(0.0)
    }

    fn flag(&self, name: &str) -> bool {
        self.str(name) == "1"
    }
}

/// Read one table, mapping each record through `parse`.
///
/// Optional tables that are absent yield an empty vector. `parse` returning
/// `None` skips the record.
fn read_table<T>(
    dir: &Path,
    file: &'static str,
    required: bool,
    parse: impl Fn(&Row<'_>) -> Option<T>,
) -> Result<Vec<T>, FeedError> {
    let path = dir.join(file);
    if !path.exists() {
        if required {
            return Err(FeedError::MissingFile { path });
        }
        info!(file, "Optional feed file not present");
        return Ok(Vec::new());
    }

    let handle = File::open(&path).map_err(|source| FeedError::Io {
        path: path.clone(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(handle);

    let columns: HashMap<String, usize> = reader
        .headers()
        .map_err(|source| FeedError::Csv { file, source })?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result.map_err(|source| FeedError::Csv { file, source })?;
        let row = Row {
            columns: &columns,
            record: &record,
        };
        match parse(&row) {
            Some(value) => rows.push(value),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(file, skipped, "Skipped unusable feed records");
    }
    debug!(file, rows = rows.len(), "Read feed table");
    Ok(rows)
}

/// Load a complete feed from `dir`.
///
/// `stops.txt`, `routes.txt`, `trips.txt` and `stop_times.txt` are required;
/// calendars and transfers are optional.
pub fn load_feed(dir: impl AsRef<Path>) -> Result<Feed, FeedError> {
    let dir = dir.as_ref();

    let stops = read_table(dir, "stops.txt", true, |r| {
        Some(Stop {
            id: r.string("stop_id"),
            code: r.string("stop_code"),
            name: r.string("stop_name"),
            lat: r.float("stop_lat"),
            lon: r.float("stop_lon"),
            location_type: r.int("location_type"),
            parent_station: r.string("parent_station"),
            wheelchair_boarding: r.int("wheelchair_boarding"),
        })
    })?;

    let routes = read_table(dir, "routes.txt", true, |r| {
        Some(Route {
            id: r.string("route_id"),
            agency_id: r.string("agency_id"),
            short_name: r.string("route_short_name"),
            long_name: r.string("route_long_name"),
            route_type: r.int("route_type"),
        })
    })?;

    let trips = read_table(dir, "trips.txt", true, |r| {
        Some(Trip {
            id: r.string("trip_id"),
            route_id: r.string("route_id"),
            service_id: r.string("service_id"),
            headsign: r.string("trip_headsign"),
            direction_id: r.int("direction_id"),
            shape_id: r.string("shape_id"),
            wheelchair_accessible: r.int("wheelchair_accessible"),
        })
    })?;

    let calendars = read_table(dir, "calendar.txt", false, |r| {
        Some(Calendar {
            service_id: r.string("service_id"),
            monday: r.flag("monday"),
            tuesday: r.flag("tuesday"),
            wednesday: r.flag("wednesday"),
            thursday: r.flag("thursday"),
            friday: r.flag("friday"),
            saturday: r.flag("saturday"),
            sunday: r.flag("sunday"),
            start_date: r.string("start_date"),
            end_date: r.string("end_date"),
        })
    })?;

    let calendar_dates = read_table(dir, "calendar_dates.txt", false, |r| {
        Some(CalendarDate {
            service_id: r.string("service_id"),
            date: r.string("date"),
            exception_type: r.int("exception_type"),
        })
    })?;

    let stop_times = read_table(dir, "stop_times.txt", true, |r| {
        // Non-timepoint rows may leave one of the two times blank
        let arrival = parse_gtfs_time(r.str("arrival_time")).ok();
        let departure = parse_gtfs_time(r.str("departure_time")).ok();
        let (arrival_time, departure_time) = match (arrival, departure) {
            (Some(a), Some(d)) => (a, d),
            (Some(a), None) => (a, a),
            (None, Some(d)) => (d, d),
            (None, None) => return None,
        };
        Some(StopTime {
            trip_id: r.string("trip_id"),
            stop_id: r.string("stop_id"),
            arrival_time,
            departure_time,
            stop_sequence: r.int("stop_sequence"),
        })
    })?;

    let transfers = read_table(dir, "transfers.txt", false, |r| {
        Some(Transfer {
            from_stop_id: r.string("from_stop_id"),
            to_stop_id: r.string("to_stop_id"),
            transfer_type: r.int("transfer_type"),
            min_transfer_time: r.int("min_transfer_time"),
        })
    })?;

    let feed = Feed {
        stops,
        routes,
        trips,
        calendars,
        calendar_dates,
        stop_times,
        transfers,
    };
    info!(
        dir = %dir.display(),
        stops = feed.stops.len(),
        trips = feed.trips.len(),
        stop_times = feed.stop_times.len(),
        "Loaded GTFS feed"
    );
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn write_minimal(dir: &Path) {
        write(
            dir,
            "stops.txt",
            "stop_id,stop_name,stop_lat,stop_lon,location_type,parent_station\n\
             S1,Náměstí Míru,50.07,14.43,1,\n\
             P1,Náměstí Míru A,50.07,14.43,0,S1\n",
        );
        write(
            dir,
            "routes.txt",
            "route_id,agency_id,route_short_name,route_long_name,route_type\nR1,A,22,,0\n",
        );
        write(
            dir,
            "trips.txt",
            "route_id,service_id,trip_id,trip_headsign\nR1,WK,T1,Bílá Hora\n",
        );
        write(
            dir,
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,08:00:00,08:00:00,P1,1\n\
             T1,,25:10:00,P1,2\n\
             T1,,,P1,3\n",
        );
    }

    #[test]
    fn loads_minimal_feed() {
        let dir = tempdir().unwrap();
        write_minimal(dir.path());

        let feed = load_feed(dir.path()).unwrap();

        assert_eq!(feed.stops.len(), 2);
        assert!(feed.stops[0].is_station());
        assert_eq!(feed.stops[1].parent(), Some("S1"));
        assert_eq!(feed.stops[0].name, "Náměstí Míru");
        assert_eq!(feed.routes[0].short_name, "22");
        assert_eq!(feed.trips[0].headsign, "Bílá Hora");
        assert!(feed.calendars.is_empty());
        assert!(feed.transfers.is_empty());
    }

    #[test]
    fn blank_stop_time_falls_back_to_other_time() {
        let dir = tempdir().unwrap();
        write_minimal(dir.path());

        let feed = load_feed(dir.path()).unwrap();

        // Row with no times at all is skipped
        assert_eq!(feed.stop_times.len(), 2);
        assert_eq!(feed.stop_times[0].departure_time, 28800);
        assert_eq!(feed.stop_times[1].arrival_time, 25 * 3600 + 600);
        assert_eq!(feed.stop_times[1].departure_time, 25 * 3600 + 600);
    }

    #[test]
    fn reads_calendars_when_present() {
        let dir = tempdir().unwrap();
        write_minimal(dir.path());
        write(
            dir.path(),
            "calendar.txt",
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             WK, 1, 1, 1, 1, 1, 0, 0, 20240101, 20241231\n",
        );
        write(
            dir.path(),
            "calendar_dates.txt",
            "service_id,date,exception_type\nWK,20240101,2\n",
        );

        let feed = load_feed(dir.path()).unwrap();

        assert_eq!(feed.calendars.len(), 1);
        let cal = &feed.calendars[0];
        assert!(cal.monday && cal.friday);
        assert!(!cal.saturday && !cal.sunday);
        assert_eq!(cal.start_date, "20240101");
        assert_eq!(feed.calendar_dates[0].exception_type, 2);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = tempdir().unwrap();
        write_minimal(dir.path());
        std::fs::remove_file(dir.path().join("trips.txt")).unwrap();

        let err = load_feed(dir.path()).unwrap_err();
        assert!(matches!(err, FeedError::MissingFile { .. }));
        assert!(err.to_string().contains("trips.txt"));
    }
}
