use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use model::Location;
use serde::Deserialize;

use crate::{
    common::{RouteErrorResponse, RouteResult},
    WebState,
};

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
    /// Request-scoped Places key; absent means the Nominatim fallback.
    pub key: Option<String>,
    pub password: Option<String>,
}

/// `GET /api/geocode`: address resolution for the setup wizard. Results
/// are cached in the shared store permanently, so setup-time lookups
/// never repeat. Guarded by the admin password when one is configured.
pub async fn lookup(
    State(state): State<WebState>,
    Query(query): Query<GeocodeQuery>,
) -> RouteResult<Json<Location>> {
    if let Some(expected) = &state.config.admin_password {
        if query.password.as_deref() != Some(expected.as_str()) {
            return Err(RouteErrorResponse::new(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
            ));
        }
    }
    if query.q.trim().is_empty() {
        return Err(RouteErrorResponse::bad_request("empty address"));
    }

    let location = state
        .geocoder
        .resolve(query.q.trim(), query.key.as_deref())
        .await
        .map_err(|why| {
            log::warn!("geocode failed for wizard lookup: {why}");
            RouteErrorResponse::new(StatusCode::NOT_FOUND, "no_result")
        })?;
    Ok(Json(location))
}
