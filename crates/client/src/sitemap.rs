//! Sitemap download and `<loc>` extraction.

use a11y_core::sitemap::{extract_locs, SitemapError};

use crate::error::ClientError;
use crate::http;

/// Errors from fetching and parsing a sitemap.
#[derive(Debug, thiserror::Error)]
pub enum SitemapFetchError {
    /// The document could not be downloaded.
    #[error("Failed to fetch sitemap: {0}")]
    Fetch(#[from] ClientError),

    /// The document was downloaded but is not a well-formed sitemap.
    #[error(transparent)]
    Parse(#[from] SitemapError),
}

/// Downloads sitemap documents.
///
/// Each call re-fetches the document; nothing is cached.
pub struct SitemapClient {
    client: reqwest::Client,
}

impl SitemapClient {
    pub fn new() -> Result<Self, ClientError> {
        Ok(Self::with_client(http::build_client(
            http::DEFAULT_REQUEST_TIMEOUT,
        )?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Download the raw sitemap document.
    pub async fn fetch(&self, sitemap_url: &str) -> Result<String, ClientError> {
        let response = self.client.get(sitemap_url).send().await?;
        let response = http::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    /// Download a sitemap and return its page URLs in document order.
    pub async fn fetch_urls(&self, sitemap_url: &str) -> Result<Vec<String>, SitemapFetchError> {
        let body = self.fetch(sitemap_url).await?;
        let urls = extract_locs(&body)?;
        tracing::info!(sitemap_url, url_count = urls.len(), "Sitemap parsed");
        Ok(urls)
    }
}
