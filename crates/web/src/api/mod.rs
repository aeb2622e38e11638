use axum::{routing::get, Router};

use crate::WebState;

pub mod geocode;
pub mod pair;
pub mod status;
pub mod zones;

pub fn routes(state: WebState) -> Router {
    Router::new()
        .route("/zones", get(zones::zones))
        .route("/zone/:id", get(zones::zone))
        .route("/screen", get(zones::screen))
        .route("/livedash", get(zones::livedash))
        .route("/geocode", get(geocode::lookup))
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/pair/:code", get(pair::poll).post(pair::write))
        .with_state(state)
}
