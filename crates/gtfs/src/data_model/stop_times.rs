use serde::Deserialize;

use super::GtfsTime;

/// A row of `stop_times.txt`.
/// See <https://gtfs.org/schedule/reference/#stop_timestxt>
#[derive(Debug, Clone, Deserialize)]
pub struct StopTimeRow {
    pub trip_id: String,
    #[serde(deserialize_with = "crate::serde::gtfs_time::option", default)]
    pub arrival_time: Option<GtfsTime>,
    #[serde(deserialize_with = "crate::serde::gtfs_time::option", default)]
    pub departure_time: Option<GtfsTime>,
    pub stop_id: String,
    pub stop_sequence: u32,
}

impl StopTimeRow {
    /// The instant a rider can board: departure time, falling back to the
    /// arrival time for terminal-style rows.
    pub fn boarding_time(&self) -> Option<GtfsTime> {
        self.departure_time.or(self.arrival_time)
    }

    pub fn alighting_time(&self) -> Option<GtfsTime> {
        self.arrival_time.or(self.departure_time)
    }
}
