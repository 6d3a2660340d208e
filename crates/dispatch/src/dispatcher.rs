//! Stage composition for a dispatch run.
//!
//! `prepare (resolve URLs) -> create report -> drain queue -> final report`. Each
//! stage returns a `Result`; sitemap and report-creation failures abort
//! before any URL is queued.

use std::sync::Arc;

use a11y_core::types::{NewReport, Report};
use tokio_util::sync::CancellationToken;

use crate::config::DispatchConfig;
use crate::error::{DispatchError, Entity};
use crate::queue::{JobQueue, QueueSummary};
use crate::source::{Auditor, ReportStore, UrlSource};

/// Runs accessibility audits for a sitemap or an explicit URL list.
pub struct Dispatcher<S, A> {
    store: Arc<S>,
    auditor: Arc<A>,
    config: DispatchConfig,
}

impl<S, A> Dispatcher<S, A>
where
    S: ReportStore,
    A: Auditor,
{
    pub fn new(store: Arc<S>, auditor: Arc<A>, config: DispatchConfig) -> Self {
        Self {
            store,
            auditor,
            config,
        }
    }

    /// Audit every page listed in the sitemap at `sitemap_url`.
    pub async fn run_on_sitemap<U: UrlSource>(
        &self,
        source: &U,
        sitemap_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Report, DispatchError> {
        let new_report = self.prepare_sitemap(source, sitemap_url).await?;
        self.run(new_report, cancel).await
    }

    /// Audit an explicit list of pages.
    pub async fn run_on_list(
        &self,
        urls: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<Report, DispatchError> {
        let new_report = self.prepare_list(urls)?;
        self.run(new_report, cancel).await
    }

    /// Resolve the sitemap into a report request rooted at the sitemap URL.
    pub async fn prepare_sitemap<U: UrlSource>(
        &self,
        source: &U,
        sitemap_url: &str,
    ) -> Result<NewReport, DispatchError> {
        let urls = source.fetch_urls(sitemap_url).await?;
        tracing::info!(sitemap_url, url_count = urls.len(), "Resolved sitemap");

        Ok(NewReport::new(sitemap_url, &self.config.standard, urls)?)
    }

    /// Report request for an explicit list, rooted at its first URL.
    pub fn prepare_list(&self, urls: Vec<String>) -> Result<NewReport, DispatchError> {
        Ok(NewReport::from_list(&self.config.standard, urls)?)
    }

    async fn run(
        &self,
        new_report: NewReport,
        cancel: &CancellationToken,
    ) -> Result<Report, DispatchError> {
        let report = self.create_report(&new_report).await?;
        let summary = self.drain(&report, new_report.urls, cancel).await?;
        Ok(finalize(report, &summary))
    }

    /// Create the report record that every later write refers to.
    pub async fn create_report(&self, new_report: &NewReport) -> Result<Report, DispatchError> {
        let report = self
            .store
            .create_report(new_report)
            .await
            .map_err(|e| DispatchError::persistence(Entity::Report, &new_report.root_url, e))?;

        tracing::info!(
            report_id = %report.id,
            root_url = %report.root_url,
            url_count = new_report.urls.len(),
            "Report created",
        );
        Ok(report)
    }

    /// Drain `urls` for an existing report.
    ///
    /// The URL list is taken from the request rather than the API's echo so
    /// a store that omits `urls` in its response still gets every page.
    pub async fn drain(
        &self,
        report: &Report,
        urls: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<QueueSummary, DispatchError> {
        JobQueue::new(
            Arc::clone(&self.store),
            Arc::clone(&self.auditor),
            &report.id,
            urls,
            self.config.concurrency,
        )
        .with_retry(self.config.retry.clone())
        .cancel_on_failure(self.config.cancel_on_failure)
        .run(cancel)
        .await
    }
}

/// Fold the final progress snapshot into the created report.
fn finalize(mut report: Report, summary: &QueueSummary) -> Report {
    report.progress = summary.progress.ratio;
    report.codes = summary.progress.codes.clone();
    report
}
