//! ImageFetcher port - retrieval of source image bytes.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PipelineError;

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Retrieve the bytes behind one source locator. A non-2xx response is a
    /// failure, same as a network error.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError>;
}

/// HTTP fetcher with a bounded request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Other(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Fetch {
                url: url.to_string(),
                reason: format!("status {status}"),
            });
        }

        let bytes = response.bytes().await.map_err(|e| PipelineError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}
