use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stop::ModeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertSeverity {
    Info,
    Minor,
    Major,
    Disruption,
}

/// What the alert does to the service, as far as the feed says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertEffect {
    NoService,
    ReducedService,
    SignificantDelays,
    Detour,
    Other,
}

/// A service alert from the authority's alert feed.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAlert {
    pub alert_id: String,
    pub route_ids: Vec<String>,
    pub stop_ids: Vec<String>,
    pub severity: AlertSeverity,
    pub effect_from: Option<DateTime<Utc>>,
    pub effect_to: Option<DateTime<Utc>>,
    pub header_text: String,
    pub description_text: Option<String>,
    pub mode: ModeType,
    pub effect: Option<AlertEffect>,
}

impl ServiceAlert {
    /// Whether the alert is in effect at the given instant. Open-ended
    /// bounds are treated as always started / never ending.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        let started = self.effect_from.map(|from| from <= now).unwrap_or(true);
        let ongoing = self.effect_to.map(|to| now <= to).unwrap_or(true);
        started && ongoing
    }

    pub fn affects_route(&self, route_id: &str) -> bool {
        self.route_ids.iter().any(|id| id == route_id)
    }

    pub fn is_disruption(&self) -> bool {
        self.severity >= AlertSeverity::Major
    }
}
