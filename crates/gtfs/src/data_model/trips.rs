use serde::Deserialize;

/// A row of `trips.txt`.
/// See <https://gtfs.org/schedule/reference/#tripstxt>
#[derive(Debug, Clone, Deserialize)]
pub struct TripRow {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub trip_headsign: Option<String>,
    #[serde(default)]
    pub direction_id: Option<u8>,
}
