//! Bounded-concurrency dispatch of accessibility audits.
//!
//! [`Dispatcher`] sequences the stages of a run: resolve the URL list,
//! create the report, drain the URLs through a [`JobQueue`] and return the
//! final report. The queue bounds how many URLs are audited at once,
//! retries failed worker calls with backoff, and folds every success into
//! the report through [`ResultAggregator`] and [`ProgressTracker`].

pub mod aggregator;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod queue;
pub mod source;
pub mod tracker;

pub use aggregator::ResultAggregator;
pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use queue::{JobQueue, QueueSummary};
pub use source::{Auditor, ReportStore, UrlSource};
pub use tracker::ProgressTracker;
