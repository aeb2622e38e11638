pub mod data_model;
pub mod realtime;
pub mod schedule;
mod serde;

use model::ModeType;

/// Authority-specific knowledge needed to turn raw feed entities into
/// displayable departures. Implemented by the transit layer per state.
pub trait AuthorityRules: Send + Sync {
    /// Whether the stop id belongs to the authority's CBD terminus set.
    fn is_cbd_terminus(&self, stop_id: &str) -> bool;

    /// Display name for a route id. Unknown codes surface the raw code.
    fn line_name(&self, route_id: &str) -> String;

    /// The mode a route id belongs to, when the id encodes it.
    fn mode_for_route(&self, route_id: &str) -> Option<ModeType>;
}
