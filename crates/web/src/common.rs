use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub type RouteResult<O> = Result<O, RouteErrorResponse>;

/// The JSON error body every failing route answers with. Token failures
/// deliberately carry no detail about what the token decoded to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,

    pub error: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode, error: &'static str) -> Self {
        Self {
            status_code,
            error,
            message: None,
        }
    }

    pub fn bad_token() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_token")
    }

    pub fn bad_device() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_device")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request").with_message(message)
    }

    pub fn code_in_use() -> Self {
        Self::new(StatusCode::CONFLICT, "code_in_use")
    }

    pub fn unknown_zone() -> Self {
        Self::new(StatusCode::NOT_FOUND, "unknown_zone")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal")
            .with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl From<kv::pairing::PairingError> for RouteErrorResponse {
    fn from(value: kv::pairing::PairingError) -> Self {
        match value {
            kv::pairing::PairingError::CodeInUse => Self::code_in_use(),
            kv::pairing::PairingError::Kv(why) => Self::internal(why.to_string()),
        }
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}
