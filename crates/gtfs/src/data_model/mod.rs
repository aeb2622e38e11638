pub mod calendar;
pub mod routes;
pub mod stop_times;
pub mod stops;
pub mod transfers;
pub mod trips;

/// Seconds since midnight of the service day. GTFS allows values past
/// 24:00:00 for trips that run into the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GtfsTime(pub u32);

impl GtfsTime {
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// Seconds into the nominal day, wrapping past-midnight values.
    pub fn seconds_of_day(&self) -> u32 {
        self.0 % 86_400
    }
}
