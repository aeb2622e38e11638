use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stop::ModeType;

/// A service is considered delayed from one minute onwards.
pub const DELAY_THRESHOLD_SECONDS: i64 = 60;

/// One upcoming service at a stop, normalized from GTFS realtime or the
/// static timetable.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    pub stop_id: String,
    pub route_id: String,
    pub line_name: String,
    pub mode: ModeType,
    pub scheduled_time: DateTime<Utc>,
    pub predicted_time: DateTime<Utc>,
    pub delay_seconds: i64,
    pub minutes_until: u32,
    pub destination_display: String,
    pub is_citybound: bool,
    /// false means the entry came from the static timetable.
    pub is_live: bool,
    /// true when the trip skips stops between here and its terminus.
    pub is_express: bool,
    pub platform: Option<String>,
    pub trip_id: Option<String>,
    pub terminus_stop_id: String,
}

impl Departure {
    /// Recompute `minutes_until` against the given instant. Negative
    /// differences clamp to zero.
    pub fn with_minutes_until(mut self, now: DateTime<Utc>) -> Self {
        self.minutes_until = minutes_until(self.predicted_time, now);
        self
    }

    pub fn is_delayed(&self) -> bool {
        self.delay_seconds >= DELAY_THRESHOLD_SECONDS
    }

    /// Whole minutes of delay, rounded up, never negative.
    pub fn delay_minutes(&self) -> u32 {
        if self.delay_seconds <= 0 {
            0
        } else {
            ((self.delay_seconds + 59) / 60) as u32
        }
    }
}

pub fn minutes_until(predicted: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let seconds = (predicted - now).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    ((seconds as f64) / 60.0).round() as u32
}
