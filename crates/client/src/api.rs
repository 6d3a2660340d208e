//! REST client for the reporting API.
//!
//! Wraps report creation and updates, issue and URL-record submission,
//! and the read endpoints used by the `get`/`getlist` commands.

use a11y_core::types::{Issue, IssueRecord, NewReport, Report, ReportUpdate, UrlRecord};
use reqwest::header::HeaderMap;

use crate::error::ClientError;
use crate::http::{self, bearer};

/// HTTP client for one reporting API deployment.
#[derive(Debug)]
pub struct ReportApi {
    client: reqwest::Client,
    api_url: String,
    auth: HeaderMap,
}

impl ReportApi {
    /// Create an API client with the default request timeout.
    ///
    /// * `api_url` - Base URL, e.g. `https://api.seoa11y.com`.
    pub fn new(api_url: impl Into<String>, token: &str) -> Result<Self, ClientError> {
        let client = http::build_client(http::DEFAULT_REQUEST_TIMEOUT)?;
        Self::with_client(client, api_url, token)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (connection pooling with the worker client).
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        token: &str,
    ) -> Result<Self, ClientError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            api_url,
            auth: bearer(token)?,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.api_url, path)
    }

    // ---- writes ----

    /// `POST /api/reports`. Returns the created report with its `_id`.
    pub async fn create_report(&self, report: &NewReport) -> Result<Report, ClientError> {
        let response = self
            .client
            .post(self.endpoint("reports"))
            .headers(self.auth.clone())
            .json(report)
            .send()
            .await?;

        http::parse_response(response).await
    }

    /// `PUT /api/reports/{id}` with a partial `{progress, codes}` body.
    pub async fn update_report(
        &self,
        report_id: &str,
        update: &ReportUpdate,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .put(self.endpoint(&format!("reports/{report_id}")))
            .headers(self.auth.clone())
            .json(update)
            .send()
            .await?;

        http::check_status(response).await
    }

    /// `POST /api/issues` for one issue found on `url`.
    pub async fn create_issue(
        &self,
        report_id: &str,
        url: &str,
        issue: &Issue,
    ) -> Result<(), ClientError> {
        let record = IssueRecord {
            issue,
            report_id,
            url,
        };
        let response = self
            .client
            .post(self.endpoint("issues"))
            .headers(self.auth.clone())
            .json(&record)
            .send()
            .await?;

        http::check_status(response).await
    }

    /// `POST /api/urls` with a page's summary.
    pub async fn create_url(&self, record: &UrlRecord) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.endpoint("urls"))
            .headers(self.auth.clone())
            .json(record)
            .send()
            .await?;

        http::check_status(response).await
    }

    // ---- reads ----

    /// `GET /api/reports/{id}`.
    pub async fn get_report(&self, report_id: &str) -> Result<Report, ClientError> {
        self.get_json(&format!("reports/{report_id}"), &[]).await
    }

    /// `GET /api/issues/{id}`.
    pub async fn get_issue(&self, issue_id: &str) -> Result<serde_json::Value, ClientError> {
        self.get_json(&format!("issues/{issue_id}"), &[]).await
    }

    /// `GET /api/urls/{id}`.
    pub async fn get_url(&self, url_id: &str) -> Result<serde_json::Value, ClientError> {
        self.get_json(&format!("urls/{url_id}"), &[]).await
    }

    /// `GET /api/reports` filtered by `query`.
    pub async fn list_reports(&self, query: &[(String, String)]) -> Result<Vec<Report>, ClientError> {
        self.get_json("reports", query).await
    }

    /// `GET /api/issues` filtered by `query` (e.g. `reportId`, `code`).
    pub async fn list_issues(
        &self,
        query: &[(String, String)],
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        self.get_json("issues", query).await
    }

    /// `GET /api/urls` filtered by `query`.
    pub async fn list_urls(&self, query: &[(String, String)]) -> Result<Vec<UrlRecord>, ClientError> {
        self.get_json("urls", query).await
    }

    /// The `context` snippet of every issue matching `query`.
    ///
    /// Issues without a context are skipped.
    pub async fn list_contexts(&self, query: &[(String, String)]) -> Result<Vec<String>, ClientError> {
        let issues: Vec<Issue> = self.get_json("issues", query).await?;
        Ok(issues.into_iter().filter_map(|issue| issue.context).collect())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ClientError> {
        tracing::debug!(path, "GET reporting API");
        let response = self
            .client
            .get(self.endpoint(path))
            .headers(self.auth.clone())
            .query(query)
            .send()
            .await?;

        http::parse_response(response).await
    }
}
