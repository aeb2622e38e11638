mod geohash;

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

pub const BOM_API_URL: &str = "https://api.weather.bom.gov.au/v1";

/// Weather responses are reused for five minutes per coordinate bucket.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Upstream deadline for a single weather call.
const FETCH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("weather response missed expected fields")]
    MissingData,
}

/// The only weather facts the dashboard consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub temperature_c: i32,
    pub condition: String,
    pub rain_expected: bool,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    data: ObservationsData,
}

#[derive(Debug, Deserialize)]
struct ObservationsData {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyForecastResponse {
    data: Vec<DailyForecast>,
}

#[derive(Debug, Deserialize)]
struct DailyForecast {
    short_text: Option<String>,
    rain: Option<RainForecast>,
}

#[derive(Debug, Deserialize)]
struct RainForecast {
    chance: Option<u8>,
}

struct CacheEntry {
    report: WeatherReport,
    fetched_at: Instant,
}

/// Bureau client with a per-bucket cache. Failures degrade to the stale
/// entry, then to nothing; callers never see an error.
pub struct WeatherClient {
    http: reqwest::Client,
    cache: Mutex<HashMap<String, CacheEntry>>,
    enabled: bool,
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("weather http client builds");
        Self {
            http,
            cache: Mutex::new(HashMap::new()),
            enabled: true,
        }
    }

    /// A client that never calls the bureau. The header simply renders
    /// without a weather box.
    pub fn disabled() -> Self {
        let mut client = Self::new();
        client.enabled = false;
        client
    }

    /// Coordinates are bucketed to 0.1 degrees so neighbouring addresses
    /// share an entry.
    fn bucket(latitude: f64, longitude: f64) -> String {
        format!("{:.1},{:.1}", latitude, longitude)
    }

    /// Current conditions near the coordinate, or `None` when the bureau
    /// is unreachable and nothing cached remains usable.
    pub async fn report(&self, latitude: f64, longitude: f64) -> Option<WeatherReport> {
        if !self.enabled {
            return None;
        }
        let key = Self::bucket(latitude, longitude);

        {
            let cache = self.cache.lock().await;
            if let Some(entry) = cache.get(&key) {
                if entry.fetched_at.elapsed() < CACHE_TTL {
                    return Some(entry.report.clone());
                }
            }
        }

        match self.fetch(latitude, longitude).await {
            Ok(report) => {
                let mut cache = self.cache.lock().await;
                cache.insert(
                    key,
                    CacheEntry {
                        report: report.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Some(report)
            }
            Err(why) => {
                log::warn!("weather fetch failed, using stale data if any: {why}");
                let cache = self.cache.lock().await;
                cache.get(&key).map(|entry| entry.report.clone())
            }
        }
    }

    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherReport, WeatherError> {
        let location = geohash::encode(latitude, longitude, 6);

        let observations: ObservationsResponse = self
            .http
            .get(format!("{BOM_API_URL}/locations/{location}/observations"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let forecast: DailyForecastResponse = self
            .http
            .get(format!("{BOM_API_URL}/locations/{location}/forecasts/daily"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let temperature = observations.data.temp.ok_or(WeatherError::MissingData)?;
        let today = forecast.data.first();
        let condition = today
            .and_then(|day| day.short_text.clone())
            .unwrap_or_else(|| "Clear".to_owned());
        let chance = today
            .and_then(|day| day.rain.as_ref())
            .and_then(|rain| rain.chance)
            .unwrap_or(0);

        Ok(WeatherReport {
            temperature_c: temperature.round() as i32,
            rain_expected: chance >= 50 || rainy_words(&condition),
            condition,
        })
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }
}

fn rainy_words(condition: &str) -> bool {
    let lower = condition.to_lowercase();
    ["rain", "shower", "storm", "drizzle"]
        .iter()
        .any(|word| lower.contains(word))
}
