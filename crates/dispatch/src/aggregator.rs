//! Per-URL result persistence.

use std::sync::Arc;

use a11y_core::metadata::summarize_issues;
use a11y_core::types::{Issue, UrlRecord};
use futures::future::join_all;

use crate::error::{DispatchError, Entity};
use crate::source::ReportStore;

/// Turns one page's issues into persisted issue records and a URL record.
pub struct ResultAggregator<S> {
    store: Arc<S>,
    report_id: String,
}

impl<S: ReportStore> ResultAggregator<S> {
    pub fn new(store: Arc<S>, report_id: impl Into<String>) -> Self {
        Self {
            store,
            report_id: report_id.into(),
        }
    }

    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    /// Compute the URL record for `url` without persisting anything.
    pub fn summarize(&self, url: &str, issues: &[Issue]) -> UrlRecord {
        summarize_issues(&self.report_id, url, issues)
    }

    /// Persist every issue and the URL record concurrently.
    ///
    /// Each submission is independent: a rejected issue does not stop the
    /// others. Returns every failure once all writes have resolved.
    pub async fn persist(&self, issues: &[Issue], record: &UrlRecord) -> Vec<DispatchError> {
        let url = record.url.as_str();
        let issue_writes = join_all(
            issues
                .iter()
                .map(|issue| self.store.create_issue(&self.report_id, url, issue)),
        );
        let record_write = self.store.create_url(record);

        let (issue_results, record_result) = tokio::join!(issue_writes, record_write);

        let mut failures: Vec<DispatchError> = issue_results
            .into_iter()
            .filter_map(Result::err)
            .map(|e| DispatchError::persistence(Entity::Issue, url, e))
            .collect();
        if let Err(e) = record_result {
            failures.push(DispatchError::persistence(Entity::UrlRecord, url, e));
        }

        if !failures.is_empty() {
            tracing::error!(
                report_id = %self.report_id,
                url,
                failed = failures.len(),
                "Failed to persist results",
            );
        }
        failures
    }
}
