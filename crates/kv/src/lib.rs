use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod pairing;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("kv backend error: {0}")]
    Backend(String),
    #[error("kv value is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The shared key-value namespace. Pairing entries and persistent caches
/// live here. All server instances of a deployment must see the same
/// store; [`MemoryStore`] satisfies the trait for single-process
/// development only, and a networked backend plugs in through this same
/// trait for anything else.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Stores a value, optionally expiring after `ttl`.
    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), KvError>;

    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Number of live entries, for the status endpoint.
    async fn len(&self) -> Result<usize, KvError>;
}
