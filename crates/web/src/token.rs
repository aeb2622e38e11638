use model::JourneyConfig;
use render::DeviceKind;
use serde::Deserialize;

use crate::common::RouteErrorResponse;

/// The query pair every image-producing endpoint takes: which device is
/// asking, and the self-describing configuration token.
#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    pub device: String,
    pub token: String,
    /// Client-held zone hashes, `id:hex` comma-separated.
    pub since: Option<String>,
}

pub fn parse_device(value: &str) -> Result<DeviceKind, RouteErrorResponse> {
    DeviceKind::parse(value).ok_or_else(RouteErrorResponse::bad_device)
}

pub fn parse_token(token: &str) -> Result<JourneyConfig, RouteErrorResponse> {
    JourneyConfig::decode_token(token).map_err(|why| {
        log::debug!("rejected config token: {why}");
        RouteErrorResponse::bad_token()
    })
}

/// Parses the `since` list into (zone id, hash) pairs; malformed entries
/// are ignored rather than failing the request.
pub fn parse_since(since: Option<&str>) -> Vec<(String, u64)> {
    since
        .unwrap_or_default()
        .split(',')
        .filter_map(|entry| {
            let (id, hex) = entry.split_once(':')?;
            let hash = u64::from_str_radix(hex.trim(), 16).ok()?;
            Some((id.trim().to_owned(), hash))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_parsing_ignores_garbage() {
        let parsed = parse_since(Some("legs:00ff,status:zz,footer"));
        assert_eq!(parsed, vec![("legs".to_owned(), 0xff)]);
        assert!(parse_since(None).is_empty());
    }

    #[test]
    fn device_parsing() {
        assert!(parse_device("trmnl-og").is_ok());
        assert!(parse_device("toaster").is_err());
    }
}
