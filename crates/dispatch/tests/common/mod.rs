//! In-memory stand-ins for the reporting API, the audit worker and the
//! sitemap source.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use a11y_client::ClientError;
use a11y_core::sitemap::ParseLevel;
use a11y_core::types::{Issue, NewReport, Report, ReportUpdate, UrlRecord};
use a11y_dispatch::{Auditor, DispatchError, ReportStore, UrlSource};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub fn issue(code: &str, type_code: i32) -> Issue {
    Issue {
        code: code.to_string(),
        context: Some(format!("<div id=\"{code}\">")),
        message: format!("{code} violated"),
        selector: format!("#{code}"),
        issue_type: match type_code {
            1 => "error",
            2 => "warning",
            _ => "notice",
        }
        .to_string(),
        type_code,
    }
}

pub fn urls(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("https://a.test/{i}")).collect()
}

fn server_error(body: &str) -> ClientError {
    ClientError::Api {
        status: 500,
        body: body.to_string(),
    }
}

// ---------------------------------------------------------------------------
// FakeStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeStore {
    pub reports: Mutex<Vec<NewReport>>,
    pub updates: Mutex<Vec<ReportUpdate>>,
    pub issues: Mutex<Vec<(String, Issue)>>,
    pub url_records: Mutex<Vec<UrlRecord>>,
    /// Reject report creation.
    pub fail_create: bool,
    /// Reject issue writes for these URLs.
    pub fail_issues_for: HashSet<String>,
    /// Reject every progress update.
    pub fail_updates: bool,
    /// Reject URL-record writes for these URLs.
    pub fail_url_records: HashSet<String>,
}

impl FakeStore {
    pub fn progress_values(&self) -> Vec<f64> {
        self.updates.lock().unwrap().iter().map(|u| u.progress).collect()
    }

    pub fn last_update(&self) -> Option<ReportUpdate> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn recorded_urls(&self) -> HashSet<String> {
        self.url_records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl ReportStore for FakeStore {
    async fn create_report(&self, report: &NewReport) -> Result<Report, ClientError> {
        if self.fail_create {
            return Err(server_error("create failed"));
        }
        self.reports.lock().unwrap().push(report.clone());
        Ok(Report {
            id: "r1".to_string(),
            root_url: report.root_url.clone(),
            standard: report.standard.clone(),
            urls: report.urls.clone(),
            progress: 0.0,
            codes: Vec::new(),
        })
    }

    async fn update_report(
        &self,
        _report_id: &str,
        update: &ReportUpdate,
    ) -> Result<(), ClientError> {
        // Yield so concurrent completions get a chance to interleave.
        tokio::task::yield_now().await;
        if self.fail_updates {
            return Err(server_error("update rejected"));
        }
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn create_issue(
        &self,
        _report_id: &str,
        url: &str,
        issue: &Issue,
    ) -> Result<(), ClientError> {
        if self.fail_issues_for.contains(url) {
            return Err(server_error("issue rejected"));
        }
        self.issues
            .lock()
            .unwrap()
            .push((url.to_string(), issue.clone()));
        Ok(())
    }

    async fn create_url(&self, record: &UrlRecord) -> Result<(), ClientError> {
        if self.fail_url_records.contains(&record.url) {
            return Err(server_error("url record rejected"));
        }
        self.url_records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeAuditor
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeAuditor {
    /// Issues returned per URL; unknown URLs have none.
    pub issues: HashMap<String, Vec<Issue>>,
    /// URLs that fail on every call.
    pub always_fail: HashSet<String>,
    /// URLs that fail this many times before succeeding.
    pub fail_times: HashMap<String, usize>,
    /// Simulated audit latency.
    pub latency: Duration,
    /// Cancelled on the first audit call.
    pub cancel_on_first_call: Option<CancellationToken>,
    pub calls: Mutex<HashMap<String, usize>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeAuditor {
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Auditor for FakeAuditor {
    async fn audit(&self, url: &str) -> Result<Vec<Issue>, DispatchError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if let Some(token) = &self.cancel_on_first_call {
            token.cancel();
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failing = self.always_fail.contains(url)
            || self.fail_times.get(url).is_some_and(|&n| call <= n);
        if failing {
            return Err(DispatchError::worker(
                url,
                ClientError::Api {
                    status: 502,
                    body: "worker unavailable".into(),
                },
            ));
        }
        Ok(self.issues.get(url).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// FakeSitemap
// ---------------------------------------------------------------------------

pub enum FakeSitemap {
    Urls(Vec<String>),
    Malformed(ParseLevel, &'static str),
}

#[async_trait]
impl UrlSource for FakeSitemap {
    async fn fetch_urls(&self, _sitemap_url: &str) -> Result<Vec<String>, DispatchError> {
        match self {
            Self::Urls(urls) => Ok(urls.clone()),
            Self::Malformed(level, message) => Err(DispatchError::Parse {
                level: *level,
                message: message.to_string(),
            }),
        }
    }
}
