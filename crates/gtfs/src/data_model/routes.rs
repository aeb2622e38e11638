use model::ModeType;
use serde::Deserialize;
use serde_repr::Deserialize_repr;

/// Vehicle type of a route.
/// See <https://gtfs.org/schedule/reference/#routestxt>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr, Default)]
#[repr(u8)]
pub enum RouteType {
    Tram = 0,
    SubwayOrMetro = 1,
    #[default]
    Rail = 2,
    Bus = 3,
    Ferry = 4,
    CableTram = 5,
    AerialLift = 6,
    Funicular = 7,
    Trolleybus = 11,
    Monorail = 12,
}

impl RouteType {
    pub fn to_mode(self) -> ModeType {
        match self {
            Self::Tram | Self::CableTram => ModeType::Tram,
            Self::Bus | Self::Trolleybus => ModeType::Bus,
            Self::Ferry => ModeType::Ferry,
            Self::SubwayOrMetro | Self::Monorail => ModeType::LightRail,
            Self::Rail | Self::AerialLift | Self::Funicular => ModeType::Train,
        }
    }
}

/// A row of `routes.txt`.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRow {
    pub route_id: String,
    #[serde(default)]
    pub agency_id: Option<String>,
    #[serde(default)]
    pub route_short_name: Option<String>,
    #[serde(default)]
    pub route_long_name: Option<String>,
    #[serde(deserialize_with = "crate::serde::default_if_empty", default)]
    pub route_type: RouteType,
}

impl RouteRow {
    pub fn display_name(&self) -> String {
        self.route_long_name
            .clone()
            .or_else(|| self.route_short_name.clone())
            .unwrap_or_else(|| self.route_id.clone())
    }
}
