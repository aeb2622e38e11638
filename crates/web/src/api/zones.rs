use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Offset, Utc};
use model::JourneyConfig;
use render::{DeviceKind, RenderData, WeatherInfo};
use serde::Serialize;

use crate::{
    common::{RouteErrorResponse, RouteResult},
    provider::LiveProvider,
    token::{parse_device, parse_since, parse_token, DeviceQuery},
    WebState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneEntry {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub hash: String,
    pub changed: bool,
}

/// Plans the journey and assembles everything the renderer consumes.
pub(crate) async fn render_data_for(
    state: &WebState,
    config: &JourneyConfig,
) -> RenderData {
    let now = Utc::now();
    let timezone = config.state.timezone();
    let now_local = now.with_timezone(&timezone);

    let transit = state.transit.for_state(config.state).await;
    let provider = LiveProvider::new(transit, config.transit_api_key.clone());
    let journey = state.engine.plan_journey(config, now, &provider).await;

    let weather = state
        .weather
        .report(config.home.latitude, config.home.longitude)
        .await
        .map(|report| WeatherInfo {
            temperature_c: report.temperature_c,
            condition: report.condition,
            rain_expected: report.rain_expected,
        });

    let destination_label = journey
        .destination_label()
        .unwrap_or("Work")
        .to_owned();

    RenderData {
        journey,
        weather,
        now_local: now_local.naive_local(),
        utc_offset_minutes: now_local.offset().fix().local_minus_utc() / 60,
        home_label: config.home.formatted_address.clone(),
        destination_label,
    }
}

/// `GET /api/zones`: the zone manifest with change flags against the
/// client's hashes.
pub async fn zones(
    State(state): State<WebState>,
    Query(query): Query<DeviceQuery>,
) -> RouteResult<Json<Vec<ZoneEntry>>> {
    let device = parse_device(&query.device)?;
    let config = parse_token(&query.token)?;
    let known = parse_since(query.since.as_deref());

    let data = render_data_for(&state, &config).await;
    let entries = render::zone_hashes(device, &data)
        .into_iter()
        .map(|(zone, hash)| {
            let changed = known
                .iter()
                .find(|(id, _)| id.as_str() == zone.id)
                .map(|(_, old)| *old != hash)
                .unwrap_or(true);
            ZoneEntry {
                id: zone.id.to_owned(),
                x: zone.x,
                y: zone.y,
                w: zone.w,
                h: zone.h,
                hash: format!("{hash:016x}"),
                changed,
            }
        })
        .collect();
    Ok(Json(entries))
}

/// `GET /api/zone/{id}`: one zone in the device's native format, with a
/// hash-based conditional response.
pub async fn zone(
    State(state): State<WebState>,
    Path(zone_id): Path<String>,
    Query(query): Query<DeviceQuery>,
    headers: HeaderMap,
) -> Result<Response, RouteErrorResponse> {
    let device = parse_device(&query.device)?;
    let config = parse_token(&query.token)?;
    let data = render_data_for(&state, &config).await;

    let hash = render::zone_hash(device, &zone_id, &data)
        .map_err(|_| RouteErrorResponse::unknown_zone())?;
    let etag = format!("\"{hash:016x}\"");
    if let Some(candidate) = headers.get(header::IF_NONE_MATCH) {
        if candidate.to_str().map(|v| v == etag).unwrap_or(false) {
            return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)], ())
                .into_response());
        }
    }

    match render::render_zone(device, &zone_id, &data) {
        Ok(bytes) => Ok((
            [
                (header::CONTENT_TYPE, device.format().content_type().to_owned()),
                (header::ETAG, etag),
            ],
            bytes,
        )
            .into_response()),
        Err(why) => Ok(render_failure(device, &why.to_string())),
    }
}

/// `GET /api/screen`: the full frame as PNG, whatever the device.
pub async fn screen(
    State(state): State<WebState>,
    Query(query): Query<DeviceQuery>,
) -> Result<Response, RouteErrorResponse> {
    let device = parse_device(&query.device)?;
    let config = parse_token(&query.token)?;
    let data = render_data_for(&state, &config).await;
    match render::render_full_png(device, &data) {
        Ok(bytes) => {
            Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
        }
        Err(why) => Ok(render_failure(device, &why.to_string())),
    }
}

/// `GET /api/livedash`: the full frame in the device's native format.
pub async fn livedash(
    State(state): State<WebState>,
    Query(query): Query<DeviceQuery>,
) -> Result<Response, RouteErrorResponse> {
    let device = parse_device(&query.device)?;
    let config = parse_token(&query.token)?;
    let data = render_data_for(&state, &config).await;
    match render::render_full_native(device, &data) {
        Ok(bytes) => Ok((
            [(header::CONTENT_TYPE, device.format().content_type())],
            bytes,
        )
            .into_response()),
        Err(why) => Ok(render_failure(device, &why.to_string())),
    }
}

/// Rasterization failures still answer with a decodable image, under a
/// 500 so devices know the frame is not real data.
fn render_failure(device: DeviceKind, message: &str) -> Response {
    log::error!("render failed: {message}");
    let bytes = render::render_error_frame(device, message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, device.format().content_type())],
        bytes,
    )
        .into_response()
}
