use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engine::DepartureProvider;
use model::{Departure, ModeType, ServiceAlert};
use transit::TransitData;

/// Bridges the engine's provider seam onto the transit data layer,
/// carrying the request's transit key.
pub struct LiveProvider {
    transit: Arc<TransitData>,
    api_key: Option<String>,
}

impl LiveProvider {
    pub fn new(transit: Arc<TransitData>, api_key: Option<String>) -> Self {
        Self { transit, api_key }
    }
}

#[async_trait]
impl DepartureProvider for LiveProvider {
    async fn departures(
        &self,
        stop_id: &str,
        mode: ModeType,
        now: DateTime<Utc>,
    ) -> Vec<Departure> {
        self.transit
            .departures(stop_id, mode, now, self.api_key.as_deref())
            .await
    }

    async fn alerts(&self, mode: ModeType, now: DateTime<Utc>) -> Vec<ServiceAlert> {
        self.transit
            .alerts(mode, now, self.api_key.as_deref())
            .await
    }

    async fn ride_minutes(
        &self,
        trip_id: Option<&str>,
        route_id: &str,
        from_stop_id: &str,
        to_stop_id: &str,
        mode: ModeType,
        now: DateTime<Utc>,
    ) -> Option<u32> {
        self.transit
            .ride_minutes(
                trip_id,
                route_id,
                from_stop_id,
                to_stop_id,
                mode,
                now,
                self.api_key.as_deref(),
            )
            .await
    }
}
