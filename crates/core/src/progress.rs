//! Running completion state of a report's dispatch.
//!
//! [`ProgressState`] is a plain value; callers that share it between
//! concurrent tasks are responsible for wrapping it in a lock so each
//! completion is folded in as one step.

use crate::metadata::CodeSet;
use crate::types::ReportUpdate;

/// Completed-count and accumulated codes for one report.
#[derive(Debug, Clone)]
pub struct ProgressState {
    total: usize,
    completed: usize,
    codes: CodeSet,
}

/// Point-in-time view of a [`ProgressState`], ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub ratio: f64,
    pub codes: Vec<String>,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            codes: CodeSet::new(),
        }
    }

    /// Record one completed URL and its distinct codes.
    ///
    /// The completed count saturates at `total`, so the ratio never
    /// exceeds 1.0.
    pub fn record<'a, I>(&mut self, codes: I) -> ProgressSnapshot
    where
        I: IntoIterator<Item = &'a String>,
    {
        if self.completed < self.total {
            self.completed += 1;
        }
        self.codes.merge(codes);
        self.snapshot()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed,
            total: self.total,
            ratio: self.ratio(),
            codes: self.codes.to_vec(),
        }
    }

    /// `completed / total`, with an empty report counting as done.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

impl ProgressSnapshot {
    /// Ratio as a percentage, e.g. `"66.67"`.
    pub fn percent(&self) -> String {
        format!("{:.2}", self.ratio * 100.0)
    }

    pub fn to_update(&self) -> ReportUpdate {
        ReportUpdate {
            progress: self.ratio,
            codes: self.codes.clone(),
        }
    }
}
