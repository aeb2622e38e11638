use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rand::Rng as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{KvError, KvStore};

/// Pairing entries live for ten minutes; after that the device shows a
/// fresh code.
pub const PAIRING_TTL: Duration = Duration::from_secs(600);

pub const CODE_LENGTH: usize = 6;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Error)]
pub enum PairingError {
    #[error("pairing code is claimed by another device")]
    CodeInUse,
    #[error(transparent)]
    Kv(#[from] KvError),
}

/// The KV value under `pair:{CODE}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingEntry {
    pub device_id: Option<String>,
    pub device_kind: Option<String>,
    pub webhook_url: Option<String>,
    pub preferences: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingStatus {
    Created,
    Waiting,
    Paired { webhook_url: String },
    Expired,
}

/// A six character code over A-Z0-9 from the thread RNG (ChaCha-based,
/// cryptographically seeded).
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Pairing operations over the shared store. The store owns the entries;
/// devices and the wizard only ever hold codes.
#[derive(Clone)]
pub struct PairingStore {
    store: Arc<dyn KvStore>,
}

impl PairingStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn key(code: &str) -> String {
        format!("pair:{}", code.to_ascii_uppercase())
    }

    async fn read(&self, code: &str) -> Result<Option<PairingEntry>, PairingError> {
        match self.store.get(&Self::key(code)).await? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(KvError::Corrupt)?,
            )),
            None => Ok(None),
        }
    }

    async fn write(&self, code: &str, entry: &PairingEntry) -> Result<(), PairingError> {
        let bytes = serde_json::to_vec(entry).map_err(KvError::Corrupt)?;
        self.store
            .put(&Self::key(code), bytes, Some(PAIRING_TTL))
            .await?;
        Ok(())
    }

    /// A device claims its freshly generated code. Claiming a code already
    /// held by a different device is a conflict.
    pub async fn claim(
        &self,
        code: &str,
        device_id: &str,
        device_kind: Option<&str>,
    ) -> Result<PairingStatus, PairingError> {
        match self.read(code).await? {
            Some(existing)
                if existing.device_id.as_deref() != Some(device_id)
                    && existing.device_id.is_some() =>
            {
                Err(PairingError::CodeInUse)
            }
            Some(mut existing) => {
                existing.device_id = Some(device_id.to_owned());
                existing.device_kind = device_kind.map(str::to_owned);
                self.write(code, &existing).await?;
                Ok(PairingStatus::Created)
            }
            None => {
                self.write(
                    code,
                    &PairingEntry {
                        device_id: Some(device_id.to_owned()),
                        device_kind: device_kind.map(str::to_owned),
                        webhook_url: None,
                        preferences: None,
                        created_at: Utc::now(),
                    },
                )
                .await?;
                Ok(PairingStatus::Created)
            }
        }
    }

    /// The wizard hands over the webhook url. Creates the entry when the
    /// device has not claimed the code yet.
    pub async fn complete(
        &self,
        code: &str,
        webhook_url: &str,
        preferences: Option<serde_json::Value>,
    ) -> Result<(), PairingError> {
        let mut entry = self.read(code).await?.unwrap_or(PairingEntry {
            device_id: None,
            device_kind: None,
            webhook_url: None,
            preferences: None,
            created_at: Utc::now(),
        });
        entry.webhook_url = Some(webhook_url.to_owned());
        if preferences.is_some() {
            entry.preferences = preferences;
        }
        self.write(code, &entry).await
    }

    /// A device polls its code. The paired result is delivered exactly
    /// once; the entry is deleted on that read.
    pub async fn poll(&self, code: &str) -> Result<PairingStatus, PairingError> {
        match self.read(code).await? {
            None => Ok(PairingStatus::Expired),
            Some(entry) => match entry.webhook_url {
                Some(webhook_url) => {
                    self.store.delete(&Self::key(code)).await?;
                    Ok(PairingStatus::Paired { webhook_url })
                }
                None => Ok(PairingStatus::Waiting),
            },
        }
    }
}
