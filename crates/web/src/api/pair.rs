use axum::{
    extract::{Path, State},
    Json,
};
use kv::pairing::PairingStatus;
use serde::{Deserialize, Serialize};

use crate::{
    common::{RouteErrorResponse, RouteResult},
    WebState,
};

const MAX_CODE_LENGTH: usize = 16;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairBody {
    pub webhook_url: Option<String>,
    pub preferences: Option<serde_json::Value>,
    pub device_id: Option<String>,
    pub device_kind: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairResponse {
    pub status: &'static str,
    pub webhook_url: Option<String>,
}

impl PairResponse {
    fn status(status: &'static str) -> Self {
        Self {
            status,
            webhook_url: None,
        }
    }
}

fn check_code(code: &str) -> Result<(), RouteErrorResponse> {
    if code.is_empty()
        || code.len() > MAX_CODE_LENGTH
        || !code.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(RouteErrorResponse::bad_request("malformed pairing code"));
    }
    Ok(())
}

/// `POST /api/pair/{CODE}`: a device claims its code, or the wizard
/// hands over the webhook url.
pub async fn write(
    State(state): State<WebState>,
    Path(code): Path<String>,
    Json(body): Json<PairBody>,
) -> RouteResult<Json<PairResponse>> {
    check_code(&code)?;

    if let Some(device_id) = &body.device_id {
        state
            .pairing
            .claim(&code, device_id, body.device_kind.as_deref())
            .await?;
        return Ok(Json(PairResponse::status("created")));
    }

    if let Some(webhook_url) = &body.webhook_url {
        state
            .pairing
            .complete(&code, webhook_url, body.preferences.clone())
            .await?;
        return Ok(Json(PairResponse::status("paired")));
    }

    Err(RouteErrorResponse::bad_request(
        "expected deviceId or webhookUrl",
    ))
}

/// `GET /api/pair/{CODE}`: the device poll. The paired answer arrives
/// exactly once; after that the code reads as expired.
pub async fn poll(
    State(state): State<WebState>,
    Path(code): Path<String>,
) -> RouteResult<Json<PairResponse>> {
    check_code(&code)?;

    let response = match state.pairing.poll(&code).await? {
        PairingStatus::Waiting => PairResponse::status("waiting"),
        PairingStatus::Paired { webhook_url } => PairResponse {
            status: "paired",
            webhook_url: Some(webhook_url),
        },
        PairingStatus::Expired | PairingStatus::Created => {
            PairResponse::status("expired")
        }
    };
    Ok(Json(response))
}
