//! Per-URL issue summaries and report-wide code sets.

use indexmap::IndexSet;

use crate::types::{Issue, Severity, UrlRecord};

/// Summarise one page's issues into a [`UrlRecord`].
///
/// Scans the list once: distinct codes are kept in first-seen order and
/// each issue bumps the counter for its severity. Issues whose `typeCode`
/// is not 1, 2 or 3 contribute their code but are not counted.
pub fn summarize_issues(report_id: &str, url: &str, issues: &[Issue]) -> UrlRecord {
    let mut codes = CodeSet::new();
    let mut n_errors = 0;
    let mut n_warnings = 0;
    let mut n_notices = 0;

    for issue in issues {
        codes.insert(&issue.code);
        match issue.severity() {
            Some(Severity::Error) => n_errors += 1,
            Some(Severity::Warning) => n_warnings += 1,
            Some(Severity::Notice) => n_notices += 1,
            None => {}
        }
    }

    UrlRecord {
        report_id: report_id.to_string(),
        url: url.to_string(),
        codes: codes.into_vec(),
        n_errors,
        n_warnings,
        n_notices,
    }
}

/// Insertion-ordered set of issue codes.
///
/// Merging is idempotent: folding the same codes in twice leaves the set
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSet {
    codes: IndexSet<String>,
}

impl CodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one code. Returns `true` if it was not present yet.
    pub fn insert(&mut self, code: &str) -> bool {
        if self.codes.contains(code) {
            return false;
        }
        self.codes.insert(code.to_string())
    }

    /// Fold a batch of codes into the set. Returns how many were new.
    pub fn merge<'a, I>(&mut self, codes: I) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        codes.into_iter().filter(|code| self.insert(code)).count()
    }

    /// Codes in first-seen order.
    pub fn to_vec(&self) -> Vec<String> {
        self.codes.iter().cloned().collect()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.codes.into_iter().collect()
    }
}
