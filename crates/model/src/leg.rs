use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stop::{ModeType, Stop};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoffeePosition {
    Origin,
    Interchange,
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoffeeReason {
    TimeForCoffee,
    ExtraTimeDisruption,
    FridayTreat,
    CafeClosed,
    SkipRunningLate,
    NoSlack,
}

/// One unit of the journey. The renderer pattern-matches on the variant;
/// nothing dispatches through methods.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Leg {
    #[serde(rename_all = "camelCase")]
    Walk {
        from_label: String,
        to_label: String,
        minutes: u32,
        #[serde(default)]
        is_first: bool,
        #[serde(default)]
        is_last: bool,
    },
    #[serde(rename_all = "camelCase")]
    Transit {
        mode: ModeType,
        route_id: String,
        line_name: String,
        origin: Stop,
        destination: Stop,
        /// Minutes from now until the boarded departure.
        departure_minutes: u32,
        scheduled_departure: DateTime<Utc>,
        ride_minutes: u32,
        delay_minutes: u32,
        is_delayed: bool,
        is_suspended: bool,
        is_diverted: bool,
        is_express: bool,
        /// Minutes-until of the next one or two alternate departures.
        next_departures: Vec<u32>,
        replacement_mode: Option<ModeType>,
    },
    #[serde(rename_all = "camelCase")]
    Coffee {
        cafe_name: String,
        duration_minutes: u32,
        can_get: bool,
        position: CoffeePosition,
        reason: CoffeeReason,
        interchange_stop_name: Option<String>,
    },
}

impl Leg {
    /// The leg's contribution to the journey total, excluding delay.
    pub fn minutes(&self) -> u32 {
        match self {
            Leg::Walk { minutes, .. } => *minutes,
            Leg::Transit { ride_minutes, .. } => *ride_minutes,
            Leg::Coffee {
                duration_minutes, ..
            } => *duration_minutes,
        }
    }

    pub fn is_transit(&self) -> bool {
        matches!(self, Leg::Transit { .. })
    }

    pub fn delay_minutes(&self) -> u32 {
        match self {
            Leg::Transit { delay_minutes, .. } => *delay_minutes,
            _ => 0,
        }
    }

    pub fn is_delayed(&self) -> bool {
        matches!(self, Leg::Transit { is_delayed: true, .. })
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, Leg::Transit { is_suspended: true, .. })
    }

    pub fn is_diverted(&self) -> bool {
        matches!(self, Leg::Transit { is_diverted: true, .. })
    }
}
