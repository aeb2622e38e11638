use std::{sync::Arc, time::Duration};

use kv::{KvError, KvStore};
use model::Location;
use serde::Deserialize;
use thiserror::Error;

pub const PLACES_API_URL: &str = "https://places.googleapis.com/v1";
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim asks clients to identify themselves.
const USER_AGENT: &str = concat!("commute-dash/", env!("CARGO_PKG_VERSION"));

const FETCH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Kv(#[from] KvError),
    #[error("no geocoder result for address")]
    NoResult,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestion {
    place_prediction: Option<PlacePrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacePrediction {
    place_id: String,
    text: Option<PredictionText>,
}

#[derive(Debug, Deserialize)]
struct PredictionText {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceDetails {
    location: Option<LatLng>,
    formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: String,
}

/// Resolves addresses to coordinates, preferring Places when the setup
/// stored a key and falling back to Nominatim. Every resolved address is
/// written to the shared store permanently; setup-time geography never
/// needs a second lookup.
pub struct Geocoder {
    http: reqwest::Client,
    store: Arc<dyn KvStore>,
}

impl Geocoder {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("geocoder http client builds");
        Self { http, store }
    }

    fn cache_key(address: &str) -> String {
        format!("geocode:{}", address.trim().to_lowercase())
    }

    pub async fn resolve(
        &self,
        address: &str,
        places_api_key: Option<&str>,
    ) -> Result<Location, GeocodeError> {
        let key = Self::cache_key(address);
        if let Some(bytes) = self.store.get(&key).await? {
            if let Ok(location) = serde_json::from_slice::<Location>(&bytes) {
                return Ok(location);
            }
        }

        let location = match places_api_key {
            Some(api_key) => match self.resolve_places(address, api_key).await {
                Ok(location) => location,
                Err(why) => {
                    log::warn!("places lookup failed, trying nominatim: {why}");
                    self.resolve_nominatim(address).await?
                }
            },
            None => self.resolve_nominatim(address).await?,
        };

        let bytes = serde_json::to_vec(&location).map_err(KvError::Corrupt)?;
        self.store.put(&key, bytes, None).await?;
        Ok(location)
    }

    async fn resolve_places(
        &self,
        address: &str,
        api_key: &str,
    ) -> Result<Location, GeocodeError> {
        let autocomplete: AutocompleteResponse = self
            .http
            .post(format!("{PLACES_API_URL}/places:autocomplete"))
            .header("X-Goog-Api-Key", api_key)
            .json(&serde_json::json!({ "input": address }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let prediction = autocomplete
            .suggestions
            .into_iter()
            .find_map(|suggestion| suggestion.place_prediction)
            .ok_or(GeocodeError::NoResult)?;

        let details: PlaceDetails = self
            .http
            .get(format!("{PLACES_API_URL}/places/{}", prediction.place_id))
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", "location,formattedAddress")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let position = details.location.ok_or(GeocodeError::NoResult)?;
        let formatted = details
            .formatted_address
            .or(prediction.text.map(|text| text.text))
            .unwrap_or_else(|| address.to_owned());

        Ok(Location::new(formatted, position.latitude, position.longitude))
    }

    async fn resolve_nominatim(&self, address: &str) -> Result<Location, GeocodeError> {
        let results: Vec<NominatimResult> = self
            .http
            .get(NOMINATIM_URL)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let hit = results.into_iter().next().ok_or(GeocodeError::NoResult)?;
        let latitude: f64 = hit.lat.parse().map_err(|_| GeocodeError::NoResult)?;
        let longitude: f64 = hit.lon.parse().map_err(|_| GeocodeError::NoResult)?;
        Ok(Location::new(hit.display_name, latitude, longitude))
    }
}
