use serde::Deserialize;

/// A row of `stops.txt`.
/// See <https://gtfs.org/schedule/reference/#stopstxt>
#[derive(Debug, Clone, Deserialize)]
pub struct StopRow {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    #[serde(default)]
    pub parent_station: Option<String>,
    #[serde(default)]
    pub platform_code: Option<String>,
}
