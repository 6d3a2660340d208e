//! Seams between the engine and the outside world.
//!
//! The engine talks to the reporting API through [`ReportStore`], to the
//! audit worker through [`Auditor`] and to sitemaps through
//! [`UrlSource`]. The HTTP clients from `a11y-client` implement all three;
//! tests substitute in-memory fakes.

use a11y_client::sitemap::SitemapFetchError;
use a11y_client::{ClientError, ReportApi, SitemapClient, WorkerApi};
use a11y_core::types::{Issue, NewReport, Report, ReportUpdate, UrlRecord};
use async_trait::async_trait;

use crate::error::DispatchError;

/// Create/update side of the reporting API.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn create_report(&self, report: &NewReport) -> Result<Report, ClientError>;

    async fn update_report(&self, report_id: &str, update: &ReportUpdate)
        -> Result<(), ClientError>;

    async fn create_issue(&self, report_id: &str, url: &str, issue: &Issue)
        -> Result<(), ClientError>;

    async fn create_url(&self, record: &UrlRecord) -> Result<(), ClientError>;
}

/// Audits one page. Failures are [`DispatchError::Worker`].
#[async_trait]
pub trait Auditor: Send + Sync {
    async fn audit(&self, url: &str) -> Result<Vec<Issue>, DispatchError>;
}

/// Resolves a sitemap URL into the pages it lists.
#[async_trait]
pub trait UrlSource: Send + Sync {
    async fn fetch_urls(&self, sitemap_url: &str) -> Result<Vec<String>, DispatchError>;
}

#[async_trait]
impl ReportStore for ReportApi {
    async fn create_report(&self, report: &NewReport) -> Result<Report, ClientError> {
        ReportApi::create_report(self, report).await
    }

    async fn update_report(
        &self,
        report_id: &str,
        update: &ReportUpdate,
    ) -> Result<(), ClientError> {
        ReportApi::update_report(self, report_id, update).await
    }

    async fn create_issue(
        &self,
        report_id: &str,
        url: &str,
        issue: &Issue,
    ) -> Result<(), ClientError> {
        ReportApi::create_issue(self, report_id, url, issue).await
    }

    async fn create_url(&self, record: &UrlRecord) -> Result<(), ClientError> {
        ReportApi::create_url(self, record).await
    }
}

#[async_trait]
impl Auditor for WorkerApi {
    async fn audit(&self, url: &str) -> Result<Vec<Issue>, DispatchError> {
        WorkerApi::audit(self, url)
            .await
            .map_err(|e| DispatchError::worker(url, e))
    }
}

#[async_trait]
impl UrlSource for SitemapClient {
    async fn fetch_urls(&self, sitemap_url: &str) -> Result<Vec<String>, DispatchError> {
        SitemapClient::fetch_urls(self, sitemap_url)
            .await
            .map_err(|e| match e {
                SitemapFetchError::Fetch(source) => DispatchError::Fetch {
                    url: sitemap_url.to_string(),
                    source,
                },
                SitemapFetchError::Parse(err) => err.into(),
            })
    }
}
