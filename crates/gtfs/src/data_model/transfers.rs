use serde::Deserialize;

/// A row of `transfers.txt`. Interchange walks introduced by network
/// changes (new tunnel platforms and the like) arrive through this table.
/// See <https://gtfs.org/schedule/reference/#transferstxt>
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRow {
    pub from_stop_id: String,
    pub to_stop_id: String,
    #[serde(deserialize_with = "crate::serde::default_if_empty", default)]
    pub transfer_type: u8,
    #[serde(default)]
    pub min_transfer_time: Option<u32>,
}
