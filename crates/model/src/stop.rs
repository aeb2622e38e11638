use serde::{Deserialize, Serialize};
use utility::geo;

/// Transit mode of a stop or route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModeType {
    Train,
    Tram,
    Bus,
    LightRail,
    Ferry,
    #[serde(rename = "vline")]
    VLine,
}

impl ModeType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Train => "TRAIN",
            Self::Tram => "TRAM",
            Self::Bus => "BUS",
            Self::LightRail => "LIGHT RAIL",
            Self::Ferry => "FERRY",
            Self::VLine => "V/LINE",
        }
    }
}

/// A platform-level stop. Two platforms of one station are two stops with
/// different ids; a stop id uniquely determines travel direction.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub mode: ModeType,
    pub latitude: f64,
    pub longitude: f64,
    pub route_id: Option<String>,
    pub is_interchange: Option<bool>,
}

impl Stop {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mode: ModeType,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mode,
            latitude,
            longitude,
            route_id: None,
            is_interchange: None,
        }
    }

    pub fn distance_metres_to(&self, latitude: f64, longitude: f64) -> f64 {
        geo::haversine_metres(self.latitude, self.longitude, latitude, longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_serializes_to_spec_names() {
        assert_eq!(
            serde_json::to_string(&ModeType::LightRail).unwrap(),
            "\"lightRail\""
        );
        assert_eq!(serde_json::to_string(&ModeType::VLine).unwrap(), "\"vline\"");
        assert_eq!(serde_json::to_string(&ModeType::Train).unwrap(), "\"train\"");
    }
}
