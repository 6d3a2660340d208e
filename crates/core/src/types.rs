//! Wire-level records exchanged with the worker and the reporting API.
//!
//! Field names follow the reporting API's camelCase JSON; the report
//! identifier is the document store's `_id`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Report identifiers are opaque strings assigned by the reporting API.
pub type ReportId = String;

/// Accessibility standard used when none is configured.
pub const DEFAULT_STANDARD: &str = "WCAG2AA";

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity class carried by an issue's `typeCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Notice,
}

impl Severity {
    /// Map a worker `typeCode` onto a severity class.
    pub fn from_type_code(code: i32) -> Result<Self, CoreError> {
        match code {
            1 => Ok(Self::Error),
            2 => Ok(Self::Warning),
            3 => Ok(Self::Notice),
            other => Err(CoreError::InvalidTypeCode(other)),
        }
    }

    /// Numeric code as sent by the worker.
    pub fn type_code(self) -> i32 {
        match self {
            Self::Error => 1,
            Self::Warning => 2,
            Self::Notice => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// One accessibility finding on one page, as returned by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub code: String,
    #[serde(default)]
    pub context: Option<String>,
    pub message: String,
    #[serde(default)]
    pub selector: String,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub type_code: i32,
}

impl Issue {
    /// Severity derived from `type_code`, or `None` for unknown codes.
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_type_code(self.type_code).ok()
    }
}

/// An issue as persisted by the reporting API: the worker's finding plus
/// the report and page it belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord<'a> {
    #[serde(flatten)]
    pub issue: &'a Issue,
    pub report_id: &'a str,
    pub url: &'a str,
}

// ---------------------------------------------------------------------------
// UrlRecord
// ---------------------------------------------------------------------------

/// Per-URL summary of a worker's findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    pub report_id: ReportId,
    pub url: String,
    /// Distinct issue codes in first-seen order.
    pub codes: Vec<String>,
    pub n_errors: u32,
    pub n_warnings: u32,
    pub n_notices: u32,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Body of `POST /api/reports`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub root_url: String,
    pub standard: String,
    pub urls: Vec<String>,
}

impl NewReport {
    /// Build a report request, rejecting an empty URL list.
    pub fn new(
        root_url: impl Into<String>,
        standard: impl Into<String>,
        urls: Vec<String>,
    ) -> Result<Self, CoreError> {
        if urls.is_empty() {
            return Err(CoreError::Validation(
                "A report needs at least one URL".to_string(),
            ));
        }
        Ok(Self {
            root_url: root_url.into(),
            standard: standard.into(),
            urls,
        })
    }

    /// A list-based report is rooted at its first URL.
    pub fn from_list(standard: impl Into<String>, urls: Vec<String>) -> Result<Self, CoreError> {
        let root_url = urls.first().cloned().unwrap_or_default();
        Self::new(root_url, standard, urls)
    }
}

/// A report record as stored by the reporting API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "_id")]
    pub id: ReportId,
    pub root_url: String,
    pub standard: String,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub codes: Vec<String>,
}

/// Body of `PUT /api/reports/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportUpdate {
    pub progress: f64,
    pub codes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
