pub mod coffee;
pub mod graph;
pub mod planner;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{Departure, ModeType, ServiceAlert};

pub use graph::StopGraph;
pub use planner::{Engine, PlanDefaults};

/// Departure and alert access behind a seam, so planning is a pure
/// function of its inputs and unit tests can script the network.
#[async_trait]
pub trait DepartureProvider: Send + Sync {
    async fn departures(
        &self,
        stop_id: &str,
        mode: ModeType,
        now: DateTime<Utc>,
    ) -> Vec<Departure>;

    async fn alerts(&self, mode: ModeType, now: DateTime<Utc>) -> Vec<ServiceAlert>;

    async fn ride_minutes(
        &self,
        trip_id: Option<&str>,
        route_id: &str,
        from_stop_id: &str,
        to_stop_id: &str,
        mode: ModeType,
        now: DateTime<Utc>,
    ) -> Option<u32>;
}
