use axum::{extract::State, Json};
use serde::Serialize;
use transit::FeedStatus;

use crate::{common::RouteResult, WebState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /api/health`: dependency-free liveness.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub version: &'static str,
    pub refresh_seconds: u64,
    pub schedule_stops: usize,
    pub kv_entries: usize,
    pub weather_cache_entries: usize,
    pub feed_cache_entries: usize,
    pub feeds: Vec<FeedStatus>,
}

/// `GET /api/status`: cache sizes and feed ages for operators.
pub async fn status(State(state): State<WebState>) -> RouteResult<Json<StatusResponse>> {
    let mut feeds = Vec::new();
    let mut feed_cache_entries = 0;
    for transit in state.transit.all().await {
        feed_cache_entries += transit.cache_len().await;
        feeds.extend(transit.feed_status().await);
    }
    feeds.sort_by(|a, b| a.key.cmp(&b.key));

    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        refresh_seconds: state.config.refresh_seconds,
        schedule_stops: state.transit.schedule().stop_count(),
        kv_entries: state.store.len().await.map_or(0, |len| len),
        weather_cache_entries: state.weather.cache_len().await,
        feed_cache_entries,
        feeds,
    }))
}
