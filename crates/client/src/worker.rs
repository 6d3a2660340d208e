//! Client for the audit worker endpoint.

use a11y_core::types::Issue;
use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::error::ClientError;
use crate::http::{self, bearer};

/// Body of a worker job submission.
#[derive(Debug, Serialize)]
struct JobRequest<'a> {
    url: &'a str,
}

/// HTTP client for a single worker endpoint.
///
/// Stateless apart from its configuration: each call audits one page and
/// returns the issues found on it.
#[derive(Debug)]
pub struct WorkerApi {
    client: reqwest::Client,
    worker_url: String,
    auth: HeaderMap,
}

impl WorkerApi {
    pub fn new(worker_url: impl Into<String>, token: &str) -> Result<Self, ClientError> {
        let client = http::build_client(http::DEFAULT_REQUEST_TIMEOUT)?;
        Self::with_client(client, worker_url, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        worker_url: impl Into<String>,
        token: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client,
            worker_url: worker_url.into(),
            auth: bearer(token)?,
        })
    }

    /// `POST <worker_url>` with `{url}`; returns the page's issues.
    pub async fn audit(&self, url: &str) -> Result<Vec<Issue>, ClientError> {
        let response = self
            .client
            .post(&self.worker_url)
            .headers(self.auth.clone())
            .json(&JobRequest { url })
            .send()
            .await?;

        http::parse_response(response).await
    }
}
