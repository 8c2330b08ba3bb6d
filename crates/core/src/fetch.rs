use crate::error::ScrapeError;
use async_trait::async_trait;
use reqwest::Client;

/// Fetches the HTML body of a page.
///
/// The crawler, parser, and loader all go through this seam so tests can
/// substitute in-memory fixture pages for the network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await?;
        let body = response.error_for_status()?.text().await?;
        Ok(body)
    }
}
