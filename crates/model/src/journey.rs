use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utility::clock::format_12h;

use crate::leg::Leg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusKind {
    LeaveNow,
    Delay,
    Delays,
    Disruption,
    Diversion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataSource {
    Live,
    FallbackTimetable,
}

/// The planned journey as handed to the renderer.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub legs: Vec<Leg>,
    pub total_minutes: u32,
    pub cumulative_delay_minutes: u32,
    pub arrival_time_local: NaiveTime,
    pub leave_by_time_local: NaiveTime,
    pub status: StatusKind,
    pub disruption_text: Option<String>,
    pub data_source: DataSource,
}

impl Journey {
    /// Builds a journey from its legs, deriving the totals and the status
    /// so the sum invariants hold by construction. `now_local` bounds the
    /// leave-by time from below.
    pub fn from_legs(
        legs: Vec<Leg>,
        arrival_time_local: NaiveTime,
        now_local: NaiveTime,
        data_source: DataSource,
        disruption_text: Option<String>,
    ) -> Self {
        let cumulative_delay_minutes: u32 =
            legs.iter().map(|leg| leg.delay_minutes()).sum();
        let total_minutes: u32 = legs.iter().map(|leg| leg.minutes()).sum::<u32>()
            + cumulative_delay_minutes;

        let status = derive_status(&legs, disruption_text.is_some());

        let leave_by = arrival_time_local
            - chrono::Duration::minutes(i64::from(total_minutes));
        let leave_by_time_local = leave_by.max(now_local);

        Self {
            legs,
            total_minutes,
            cumulative_delay_minutes,
            arrival_time_local,
            leave_by_time_local,
            status,
            disruption_text,
            data_source,
        }
    }

    /// The status bar text. Always phrased from the leave-now perspective;
    /// there is deliberately no "leave in N minutes" wording.
    pub fn status_message(&self) -> String {
        match self.status {
            StatusKind::LeaveNow => "LEAVE NOW".to_owned(),
            StatusKind::Delay => format!(
                "DELAY \u{2192} Arrive {} (+{} min)",
                format_12h(self.arrival_time_local),
                self.cumulative_delay_minutes
            ),
            StatusKind::Delays => format!(
                "DELAYS \u{2192} Arrive {} (+{} min)",
                format_12h(self.arrival_time_local),
                self.cumulative_delay_minutes
            ),
            StatusKind::Disruption | StatusKind::Diversion => format!(
                "DISRUPTION \u{2192} {}",
                self.disruption_text.as_deref().unwrap_or("Check services")
            ),
        }
    }

    pub fn transit_leg_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_transit()).count()
    }

    pub fn destination_label(&self) -> Option<&str> {
        self.legs.iter().rev().find_map(|leg| match leg {
            Leg::Walk { to_label, .. } => Some(to_label.as_str()),
            Leg::Transit { destination, .. } => Some(destination.name.as_str()),
            Leg::Coffee { .. } => None,
        })
    }
}

fn derive_status(legs: &[Leg], forced_disruption: bool) -> StatusKind {
    if forced_disruption || legs.iter().any(|leg| leg.is_suspended()) {
        return StatusKind::Disruption;
    }
    if legs.iter().any(|leg| leg.is_diverted()) {
        return StatusKind::Diversion;
    }
    let delayed = legs
        .iter()
        .filter(|leg| leg.is_transit() && leg.is_delayed())
        .count();
    match delayed {
        0 => StatusKind::LeaveNow,
        1 => StatusKind::Delay,
        _ => StatusKind::Delays,
    }
}
