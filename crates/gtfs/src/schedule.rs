use std::{
    collections::{BTreeSet, HashMap},
    fs::File,
    io::Read,
    path::Path,
};

use chrono::NaiveDate;
use model::ModeType;
use thiserror::Error;

use crate::data_model::{
    calendar::CalendarRow, routes::RouteRow, stop_times::StopTimeRow, stops::StopRow,
    transfers::TransferRow, trips::TripRow, GtfsTime,
};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error("required table {0} is missing from the bundle")]
    MissingTable(&'static str),
}

/// A timetable departure, before authority rules turn it into a displayable
/// `Departure`.
#[derive(Debug, Clone)]
pub struct FallbackDeparture {
    pub trip_id: String,
    pub route_id: String,
    pub stop_id: String,
    pub departure: GtfsTime,
    pub terminus_stop_id: String,
}

/// A representative stop sequence of a route in one direction.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    pub route_id: String,
    pub direction_id: Option<u8>,
    pub stop_ids: Vec<String>,
}

impl RoutePattern {
    pub fn position_of(&self, stop_id: &str) -> Option<usize> {
        self.stop_ids.iter().position(|id| id == stop_id)
    }
}

/// The static GTFS bundle, indexed for stop-level lookups. Loaded once at
/// startup and shared read-only.
pub struct Schedule {
    stops: HashMap<String, StopRow>,
    routes: HashMap<String, RouteRow>,
    trips: HashMap<String, TripRow>,
    stop_times_by_trip: HashMap<String, Vec<StopTimeRow>>,
    boardings_by_stop: HashMap<String, Vec<(GtfsTime, String)>>,
    calendar: Option<HashMap<String, CalendarRow>>,
    stop_routes: HashMap<String, BTreeSet<String>>,
    patterns: Vec<RoutePattern>,
    transfers: Vec<TransferRow>,
}

impl Schedule {
    /// Load an extracted bundle directory. `transfers.txt` and
    /// `calendar.txt` are optional; the core tables are not.
    pub fn load_dir(dir: &Path) -> Result<Self, ScheduleError> {
        let required = |name: &'static str| -> Result<File, ScheduleError> {
            File::open(dir.join(name))
                .map_err(|_| ScheduleError::MissingTable(name))
        };
        let stops = read_table(required("stops.txt")?)?;
        let routes = read_table(required("routes.txt")?)?;
        let trips = read_table(required("trips.txt")?)?;
        let stop_times = read_table(required("stop_times.txt")?)?;
        let calendar = match File::open(dir.join("calendar.txt")) {
            Ok(file) => Some(read_table(file)?),
            Err(_) => None,
        };
        let transfers = match File::open(dir.join("transfers.txt")) {
            Ok(file) => read_table(file)?,
            Err(_) => Vec::new(),
        };
        Ok(Self::from_tables(
            stops, routes, trips, stop_times, calendar, transfers,
        ))
    }

    /// Load a zipped bundle without extracting to disk.
    pub fn load_zip(path: &Path) -> Result<Self, ScheduleError> {
        let mut archive = zip::ZipArchive::new(File::open(path)?)?;

        let mut table = |name: &'static str| -> Result<Option<Vec<u8>>, ScheduleError> {
            let found = (0..archive.len()).find(|i| {
                archive
                    .by_index(*i)
                    .map(|entry| entry.name().ends_with(name))
                    .unwrap_or(false)
            });
            match found {
                Some(index) => {
                    let mut entry = archive.by_index(index)?;
                    let mut buffer = Vec::new();
                    entry.read_to_end(&mut buffer)?;
                    Ok(Some(buffer))
                }
                None => Ok(None),
            }
        };
        let require = |bytes: Option<Vec<u8>>, name: &'static str| {
            bytes.ok_or(ScheduleError::MissingTable(name))
        };

        let stops = table("stops.txt")?;
        let routes = table("routes.txt")?;
        let trips = table("trips.txt")?;
        let stop_times = table("stop_times.txt")?;
        let calendar = table("calendar.txt")?;
        let transfers = table("transfers.txt")?;

        Ok(Self::from_tables(
            read_table(require(stops, "stops.txt")?.as_slice())?,
            read_table(require(routes, "routes.txt")?.as_slice())?,
            read_table(require(trips, "trips.txt")?.as_slice())?,
            read_table(require(stop_times, "stop_times.txt")?.as_slice())?,
            match calendar {
                Some(bytes) => Some(read_table(bytes.as_slice())?),
                None => None,
            },
            match transfers {
                Some(bytes) => read_table(bytes.as_slice())?,
                None => Vec::new(),
            },
        ))
    }

    /// Assemble a schedule from already-parsed tables and build the
    /// lookup indexes.
    pub fn from_tables(
        stops: Vec<StopRow>,
        routes: Vec<RouteRow>,
        trips: Vec<TripRow>,
        mut stop_times: Vec<StopTimeRow>,
        calendar: Option<Vec<CalendarRow>>,
        transfers: Vec<TransferRow>,
    ) -> Self {
        stop_times.sort_by(|a, b| {
            a.trip_id
                .cmp(&b.trip_id)
                .then(a.stop_sequence.cmp(&b.stop_sequence))
        });

        let mut stop_times_by_trip: HashMap<String, Vec<StopTimeRow>> = HashMap::new();
        for row in stop_times {
            stop_times_by_trip
                .entry(row.trip_id.clone())
                .or_default()
                .push(row);
        }

        let trips: HashMap<String, TripRow> = trips
            .into_iter()
            .map(|trip| (trip.trip_id.clone(), trip))
            .collect();

        let mut boardings_by_stop: HashMap<String, Vec<(GtfsTime, String)>> =
            HashMap::new();
        let mut stop_routes: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (trip_id, rows) in &stop_times_by_trip {
            let Some(trip) = trips.get(trip_id) else {
                continue;
            };
            for row in rows {
                if let Some(time) = row.boarding_time() {
                    boardings_by_stop
                        .entry(row.stop_id.clone())
                        .or_default()
                        .push((time, trip_id.clone()));
                }
                stop_routes
                    .entry(row.stop_id.clone())
                    .or_default()
                    .insert(trip.route_id.clone());
            }
        }
        for boardings in boardings_by_stop.values_mut() {
            boardings.sort();
        }

        // longest trip per (route, direction) stands in for the pattern
        let mut representative: HashMap<(String, Option<u8>), &String> =
            HashMap::new();
        for (trip_id, rows) in &stop_times_by_trip {
            let Some(trip) = trips.get(trip_id) else {
                continue;
            };
            let key = (trip.route_id.clone(), trip.direction_id);
            let replace = representative
                .get(&key)
                .map(|current| {
                    stop_times_by_trip[*current].len() < rows.len()
                })
                .unwrap_or(true);
            if replace {
                representative.insert(key, trip_id);
            }
        }
        let mut patterns: Vec<RoutePattern> = representative
            .into_iter()
            .map(|((route_id, direction_id), trip_id)| RoutePattern {
                route_id,
                direction_id,
                stop_ids: stop_times_by_trip[trip_id]
                    .iter()
                    .map(|row| row.stop_id.clone())
                    .collect(),
            })
            .collect();
        patterns.sort_by(|a, b| {
            a.route_id
                .cmp(&b.route_id)
                .then(a.direction_id.cmp(&b.direction_id))
        });

        Self {
            stops: stops
                .into_iter()
                .map(|stop| (stop.stop_id.clone(), stop))
                .collect(),
            routes: routes
                .into_iter()
                .map(|route| (route.route_id.clone(), route))
                .collect(),
            trips,
            stop_times_by_trip,
            boardings_by_stop,
            calendar: calendar.map(|rows| {
                rows.into_iter()
                    .map(|row| (row.service_id.clone(), row))
                    .collect()
            }),
            stop_routes,
            patterns,
            transfers,
        }
    }

    pub fn stop(&self, stop_id: &str) -> Option<&StopRow> {
        self.stops.get(stop_id)
    }

    pub fn stops(&self) -> impl Iterator<Item = &StopRow> {
        self.stops.values()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route(&self, route_id: &str) -> Option<&RouteRow> {
        self.routes.get(route_id)
    }

    pub fn routes_at(&self, stop_id: &str) -> Option<&BTreeSet<String>> {
        self.stop_routes.get(stop_id)
    }

    pub fn mode_of_route(&self, route_id: &str) -> Option<ModeType> {
        self.routes
            .get(route_id)
            .map(|route| route.route_type.to_mode())
    }

    pub fn patterns(&self) -> &[RoutePattern] {
        &self.patterns
    }

    pub fn patterns_of<'a, 'b>(
        &'a self,
        route_id: &'b str,
    ) -> impl Iterator<Item = &'a RoutePattern> + use<'a, 'b> {
        self.patterns
            .iter()
            .filter(move |pattern| pattern.route_id == route_id)
    }

    pub fn transfers(&self) -> &[TransferRow] {
        &self.transfers
    }

    fn service_runs_on(&self, service_id: &str, date: NaiveDate) -> bool {
        match &self.calendar {
            // without a calendar table day filtering is impossible; the
            // bundle is taken to run daily
            None => true,
            Some(calendar) => calendar
                .get(service_id)
                .map(|row| row.runs_on(date))
                .unwrap_or(false),
        }
    }

    /// Timetable departures for a stop on a given service day, earliest
    /// first. Only services scheduled for that weekday and date range are
    /// produced; a stop with no remaining services yields nothing.
    pub fn departures_at(
        &self,
        stop_id: &str,
        date: NaiveDate,
        from: GtfsTime,
        limit: usize,
    ) -> Vec<FallbackDeparture> {
        let Some(boardings) = self.boardings_by_stop.get(stop_id) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        for (time, trip_id) in boardings {
            if *time < from {
                continue;
            }
            let Some(trip) = self.trips.get(trip_id) else {
                continue;
            };
            if !self.service_runs_on(&trip.service_id, date) {
                continue;
            }
            let Some(terminus) = self.terminus_of(trip_id) else {
                continue;
            };
            result.push(FallbackDeparture {
                trip_id: trip_id.clone(),
                route_id: trip.route_id.clone(),
                stop_id: stop_id.to_owned(),
                departure: *time,
                terminus_stop_id: terminus.to_owned(),
            });
            if result.len() == limit {
                break;
            }
        }
        result
    }

    pub fn terminus_of(&self, trip_id: &str) -> Option<&str> {
        self.stop_times_by_trip
            .get(trip_id)?
            .last()
            .map(|row| row.stop_id.as_str())
    }

    /// Scheduled boarding time of a trip at a stop.
    pub fn stop_time_of(&self, trip_id: &str, stop_id: &str) -> Option<GtfsTime> {
        self.stop_times_by_trip
            .get(trip_id)?
            .iter()
            .find(|row| row.stop_id == stop_id)
            .and_then(|row| row.boarding_time())
    }

    /// Scheduled riding time between two stops of one trip.
    pub fn ride_minutes(
        &self,
        trip_id: &str,
        from_stop_id: &str,
        to_stop_id: &str,
    ) -> Option<u32> {
        let rows = self.stop_times_by_trip.get(trip_id)?;
        let from = rows.iter().find(|row| row.stop_id == from_stop_id)?;
        let to = rows.iter().find(|row| row.stop_id == to_stop_id)?;
        if to.stop_sequence <= from.stop_sequence {
            return None;
        }
        let board = from.boarding_time()?;
        let alight = to.alighting_time()?;
        if alight.seconds() <= board.seconds() {
            return None;
        }
        Some((alight.seconds() - board.seconds() + 59) / 60)
    }

    /// Riding time between two stops using any trip of the route that
    /// serves both in order. Used when the realtime feed lacks the
    /// destination stop time.
    pub fn ride_minutes_on_route(
        &self,
        route_id: &str,
        from_stop_id: &str,
        to_stop_id: &str,
    ) -> Option<u32> {
        self.stop_times_by_trip
            .keys()
            .filter(|trip_id| {
                self.trips
                    .get(*trip_id)
                    .map(|trip| trip.route_id == route_id)
                    .unwrap_or(false)
            })
            .find_map(|trip_id| self.ride_minutes(trip_id, from_stop_id, to_stop_id))
    }
}

fn read_table<T, R>(reader: R) -> Result<Vec<T>, ScheduleError>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        // one bad row should not sink the whole bundle
        match row {
            Ok(parsed) => rows.push(parsed),
            Err(why) => log::warn!("skipping malformed gtfs row: {why}"),
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::calendar::ServiceAvailability;

    fn stop(id: &str, name: &str) -> StopRow {
        StopRow {
            stop_id: id.to_owned(),
            stop_name: name.to_owned(),
            stop_lat: -37.8,
            stop_lon: 145.0,
            parent_station: None,
            platform_code: None,
        }
    }

    fn trip(trip_id: &str, route_id: &str, service_id: &str) -> TripRow {
        TripRow {
            route_id: route_id.to_owned(),
            service_id: service_id.to_owned(),
            trip_id: trip_id.to_owned(),
            trip_headsign: None,
            direction_id: Some(0),
        }
    }

    fn stop_time(trip_id: &str, stop_id: &str, sequence: u32, time: GtfsTime) -> StopTimeRow {
        StopTimeRow {
            trip_id: trip_id.to_owned(),
            arrival_time: Some(time),
            departure_time: Some(time),
            stop_id: stop_id.to_owned(),
            stop_sequence: sequence,
        }
    }

    fn weekday_calendar(service_id: &str) -> CalendarRow {
        CalendarRow {
            service_id: service_id.to_owned(),
            monday: ServiceAvailability::Available,
            tuesday: ServiceAvailability::Available,
            wednesday: ServiceAvailability::Available,
            thursday: ServiceAvailability::Available,
            friday: ServiceAvailability::Available,
            saturday: ServiceAvailability::Unavailable,
            sunday: ServiceAvailability::Unavailable,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        }
    }

    fn schedule() -> Schedule {
        let route = RouteRow {
            route_id: "vic-2-BEG".to_owned(),
            agency_id: None,
            route_short_name: Some("Belgrave".to_owned()),
            route_long_name: None,
            route_type: crate::data_model::routes::RouteType::Rail,
        };
        Schedule::from_tables(
            vec![stop("1001", "Suburb"), stop("1002", "Mid"), stop("12204", "Flinders Street")],
            vec![route],
            vec![trip("t1", "vic-2-BEG", "wd"), trip("t2", "vic-2-BEG", "wd")],
            vec![
                stop_time("t1", "1001", 1, GtfsTime::from_hms(7, 15, 0)),
                stop_time("t1", "1002", 2, GtfsTime::from_hms(7, 21, 0)),
                stop_time("t1", "12204", 3, GtfsTime::from_hms(7, 27, 0)),
                stop_time("t2", "1001", 1, GtfsTime::from_hms(7, 35, 0)),
                stop_time("t2", "12204", 2, GtfsTime::from_hms(7, 47, 0)),
            ],
            Some(vec![weekday_calendar("wd")]),
            Vec::new(),
        )
    }

    #[test]
    fn departures_respect_day_and_time() {
        let schedule = schedule();
        let tuesday = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();

        let on_tuesday = schedule.departures_at(
            "1001",
            tuesday,
            GtfsTime::from_hms(7, 0, 0),
            6,
        );
        assert_eq!(on_tuesday.len(), 2);
        assert_eq!(on_tuesday[0].departure, GtfsTime::from_hms(7, 15, 0));
        assert_eq!(on_tuesday[0].terminus_stop_id, "12204");

        // weekday-only service never runs on a Saturday
        assert!(schedule
            .departures_at("1001", saturday, GtfsTime::from_hms(7, 0, 0), 6)
            .is_empty());

        // after the last service the stop yields nothing
        assert!(schedule
            .departures_at("1001", tuesday, GtfsTime::from_hms(8, 0, 0), 6)
            .is_empty());
    }

    #[test]
    fn ride_minutes_from_stop_times() {
        let schedule = schedule();
        assert_eq!(schedule.ride_minutes("t1", "1001", "12204"), Some(12));
        assert_eq!(schedule.ride_minutes("t1", "12204", "1001"), None);
        assert_eq!(
            schedule.ride_minutes_on_route("vic-2-BEG", "1002", "12204"),
            Some(6)
        );
    }

    #[test]
    fn stop_time_lookup_by_trip_and_stop() {
        let schedule = schedule();
        assert_eq!(
            schedule.stop_time_of("t1", "1002"),
            Some(GtfsTime::from_hms(7, 21, 0))
        );
        assert_eq!(schedule.stop_time_of("t1", "nope"), None);
        assert_eq!(schedule.stop_time_of("ghost", "1002"), None);
    }

    #[test]
    fn patterns_and_route_lookups() {
        let schedule = schedule();
        let patterns: Vec<_> = schedule.patterns_of("vic-2-BEG").collect();
        assert_eq!(patterns.len(), 1);
        // representative pattern is the longest trip
        assert_eq!(patterns[0].stop_ids, vec!["1001", "1002", "12204"]);
        assert!(schedule.routes_at("1002").unwrap().contains("vic-2-BEG"));
        assert_eq!(schedule.mode_of_route("vic-2-BEG"), Some(ModeType::Train));
    }
}
