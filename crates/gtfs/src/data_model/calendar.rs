use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use serde_repr::Deserialize_repr;

/// Indicates whether the service operates on a weekday within the range.
/// See <https://gtfs.org/schedule/reference/#calendartxt>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(u8)]
pub enum ServiceAvailability {
    Unavailable = 0,
    Available = 1,
}

impl ServiceAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// A row of `calendar.txt`: a weekly service pattern with a validity range.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarRow {
    pub service_id: String,
    pub monday: ServiceAvailability,
    pub tuesday: ServiceAvailability,
    pub wednesday: ServiceAvailability,
    pub thursday: ServiceAvailability,
    pub friday: ServiceAvailability,
    pub saturday: ServiceAvailability,
    pub sunday: ServiceAvailability,
    #[serde(deserialize_with = "crate::serde::yyyymmdd::deserialize")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "crate::serde::yyyymmdd::deserialize")]
    pub end_date: NaiveDate,
}

impl CalendarRow {
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        if date < self.start_date || date > self.end_date {
            return false;
        }
        let day = match date.weekday() {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        };
        day.is_available()
    }
}
