//! Shared report progress.
//!
//! Every completion is folded into the [`ProgressState`] and written to
//! the reporting API while the lock is held, so concurrent completions
//! never race on the counter or the code set and the API only ever sees
//! a non-decreasing progress value.
//!
//! The cost is that completions serialize on the update call: a slow `PUT`
//! (up to the request timeout) holds every other slot at this point, though
//! audits already in flight keep running.

use std::sync::Arc;

use a11y_core::progress::{ProgressSnapshot, ProgressState};
use tokio::sync::Mutex;

use crate::error::{DispatchError, Entity};
use crate::source::ReportStore;

pub struct ProgressTracker<S> {
    store: Arc<S>,
    report_id: String,
    state: Mutex<ProgressState>,
}

impl<S: ReportStore> ProgressTracker<S> {
    pub fn new(store: Arc<S>, report_id: impl Into<String>, total: usize) -> Self {
        Self {
            store,
            report_id: report_id.into(),
            state: Mutex::new(ProgressState::new(total)),
        }
    }

    /// Record `url` as completed with the given distinct codes and push
    /// the new snapshot to the reporting API.
    ///
    /// The snapshot is returned even when the update call fails; the
    /// failure is reported alongside it.
    pub async fn complete(
        &self,
        url: &str,
        codes: &[String],
    ) -> (ProgressSnapshot, Option<DispatchError>) {
        let mut state = self.state.lock().await;
        let snapshot = state.record(codes);

        tracing::info!(
            report_id = %self.report_id,
            url,
            completed = snapshot.completed,
            total = snapshot.total,
            "[{}%] Sending data for url",
            snapshot.percent(),
        );

        let result = self
            .store
            .update_report(&self.report_id, &snapshot.to_update())
            .await;
        drop(state);

        let failure = result.err().map(|e| {
            tracing::error!(
                report_id = %self.report_id,
                url,
                error = %e,
                "Failed to update report progress",
            );
            DispatchError::persistence(Entity::ReportUpdate, url, e)
        });
        (snapshot, failure)
    }

    pub async fn snapshot(&self) -> ProgressSnapshot {
        self.state.lock().await.snapshot()
    }
}
