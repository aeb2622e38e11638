use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Upstream deadline for a single realtime feed call.
pub const FEED_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// 4xx answers are non-retryable and negative-cached.
    #[error("authority answered {0}")]
    ClientError(u16),
    /// 5xx and transport failures retry on the next refresh boundary.
    #[error("upstream failure: {0}")]
    Retryable(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

/// The one seam between the cache discipline and the network, so tests can
/// count upstream calls.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        header_name: &str,
        header_value: &str,
    ) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpFetcher {
    http: reqwest::Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .build()
            .expect("feed http client builds");
        Self { http }
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        header_name: &str,
        header_value: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url)
            .header(header_name, header_value)
            .send()
            .await
            .map_err(|why| FetchError::Retryable(why.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(FetchError::ClientError(status.as_u16()));
        }
        if !status.is_success() {
            return Err(FetchError::Retryable(format!("status {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|why| FetchError::Retryable(why.to_string()))?;
        Ok(bytes.to_vec())
    }
}
