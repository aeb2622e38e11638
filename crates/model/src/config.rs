use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::{AuState, Location};

/// Tokens larger than this are rejected before decoding.
pub const MAX_TOKEN_BYTES: usize = 4096;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token exceeds {MAX_TOKEN_BYTES} bytes")]
    TooLarge,
    #[error("token is not valid base64url")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not valid configuration JSON")]
    Json(#[from] serde_json::Error),
    #[error("token arrival time is not HH:MM")]
    BadArrivalTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiMode {
    Cached,
    Live,
}

/// The user's configuration. The URL token IS this record; no server-side
/// row exists for a user.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyConfig {
    pub home: Location,
    pub work: Location,
    pub cafe: Option<Location>,
    pub arrival_time: NaiveTime,
    pub coffee_enabled: bool,
    pub api_mode: ApiMode,
    pub state: AuState,
    pub transit_api_key: Option<String>,
    pub places_api_key: Option<String>,
    /// Unknown token fields, preserved for forward compatibility.
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl JourneyConfig {
    /// Serialize to the URL-embedded token: short-key JSON, base64url,
    /// no padding.
    pub fn encode_token(&self) -> String {
        let payload = TokenPayload {
            a: TokenAddresses {
                home: self.home.clone(),
                work: self.work.clone(),
                cafe: self.cafe.clone(),
            },
            t: self.arrival_time.format("%H:%M").to_string(),
            c: self.coffee_enabled,
            k: self.transit_api_key.clone(),
            g: self.places_api_key.clone(),
            s: self.state,
            m: self.api_mode,
            extensions: self.extensions.clone(),
        };
        // serializing a known-shape payload cannot fail
        let json = serde_json::to_vec(&payload).expect("token payload serializes");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Inverse of [`encode_token`]. Unknown fields are kept in
    /// `extensions`; malformed input is rejected, never guessed at.
    pub fn decode_token(token: &str) -> Result<Self, TokenError> {
        if token.len() > MAX_TOKEN_BYTES {
            return Err(TokenError::TooLarge);
        }
        let json = URL_SAFE_NO_PAD.decode(token.trim())?;
        let payload: TokenPayload = serde_json::from_slice(&json)?;
        let arrival_time = NaiveTime::parse_from_str(&payload.t, "%H:%M")
            .map_err(|_| TokenError::BadArrivalTime)?;
        Ok(Self {
            home: payload.a.home,
            work: payload.a.work,
            cafe: payload.a.cafe,
            arrival_time,
            coffee_enabled: payload.c,
            api_mode: payload.m,
            state: payload.s,
            transit_api_key: payload.k,
            places_api_key: payload.g,
            extensions: payload.extensions,
        })
    }
}

/// Wire form of the token. Field names are deliberately single letters to
/// keep the URL short.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    a: TokenAddresses,
    t: String,
    #[serde(default)]
    c: bool,
    k: Option<String>,
    g: Option<String>,
    s: AuState,
    m: ApiMode,
    #[serde(flatten)]
    extensions: BTreeMap<String, serde_json::Value>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize)]
struct TokenAddresses {
    home: Location,
    work: Location,
    cafe: Option<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> JourneyConfig {
        JourneyConfig {
            home: Location::new("1 Test Pl, Carlton VIC 3053", -37.8, 144.96),
            work: Location::new("200 Work St, Melbourne VIC 3000", -37.81, 144.95),
            cafe: Some(Location::new("Cafe Corner, Carlton VIC 3053", -37.79, 144.97)),
            arrival_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            coffee_enabled: true,
            api_mode: ApiMode::Live,
            state: AuState::Vic,
            transit_api_key: Some("4e3a78be-0000-4000-8000-4f5a6c7d8e9f".to_owned()),
            places_api_key: None,
            extensions: BTreeMap::new(),
        }
    }

    #[test]
    fn token_round_trip() {
        let original = config();
        let token = original.encode_token();
        let decoded = JourneyConfig::decode_token(&token).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn token_stays_small() {
        let mut big = config();
        big.home.formatted_address = "x".repeat(200);
        big.work.formatted_address = "y".repeat(200);
        let token = big.encode_token();
        assert!(token.len() <= MAX_TOKEN_BYTES);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let mut original = config();
        original
            .extensions
            .insert("v".to_owned(), serde_json::json!(2));
        let token = original.encode_token();
        let decoded = JourneyConfig::decode_token(&token).unwrap();
        assert_eq!(decoded.extensions.get("v"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn garbage_tokens_rejected() {
        assert!(JourneyConfig::decode_token("!!not-base64!!").is_err());
        let not_json = URL_SAFE_NO_PAD.encode(b"hello");
        assert!(JourneyConfig::decode_token(&not_json).is_err());
        let oversize = "A".repeat(MAX_TOKEN_BYTES + 1);
        assert!(matches!(
            JourneyConfig::decode_token(&oversize),
            Err(TokenError::TooLarge)
        ));
    }
}
