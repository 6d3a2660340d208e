//! Bounded-concurrency URL queue.
//!
//! [`JobQueue`] drains a report's URLs through an [`Auditor`] with at most
//! `concurrency` URLs in flight. Each worker slot pulls the next ready URL
//! from a shared deque, audits it and routes the outcome:
//!
//! - success: the issues and URL record are persisted and the report's
//!   progress is updated concurrently; any failed write is recorded.
//! - failure: the URL goes back to the end of the deque with a backoff
//!   delay, until the [`RetryPolicy`] gives up and the URL is abandoned.
//!
//! The run ends when the deque is empty and no URL is in flight, or when
//! the cancellation token fires (in-flight URLs still finish). Recorded
//! failures never stop other URLs; the first one becomes the run's error.

use std::collections::VecDeque;
use std::sync::Arc;

use a11y_core::progress::ProgressSnapshot;
use a11y_core::retry::RetryPolicy;
use futures::future::join_all;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::aggregator::ResultAggregator;
use crate::error::DispatchError;
use crate::source::{Auditor, ReportStore};
use crate::tracker::ProgressTracker;

/// A URL waiting for (another) worker attempt.
#[derive(Debug)]
struct PendingUrl {
    url: String,
    /// Failed attempts so far.
    attempts: u32,
    /// Earliest time the next attempt may start.
    ready_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<PendingUrl>,
    in_flight: usize,
    max_in_flight: usize,
    abandoned: Vec<String>,
    attempts: u64,
}

/// What happened to a single attempt.
enum Outcome {
    Done,
    Retry { attempts: u32, error: DispatchError },
    Abandon { attempts: u32, error: DispatchError },
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct QueueSummary {
    /// Final progress (completed URLs, ratio, accumulated codes).
    pub progress: ProgressSnapshot,
    /// Worker calls made, retries included.
    pub attempts: u64,
    /// Highest number of URLs observed in flight at once.
    pub max_in_flight: usize,
}

pub struct JobQueue<S, A> {
    auditor: Arc<A>,
    aggregator: ResultAggregator<S>,
    tracker: ProgressTracker<S>,
    retry: RetryPolicy,
    concurrency: usize,
    cancel_on_failure: bool,
    state: Mutex<QueueState>,
    failures: Mutex<Vec<DispatchError>>,
    /// Signalled whenever a URL finishes or is re-queued.
    changed: Notify,
}

impl<S, A> JobQueue<S, A>
where
    S: ReportStore,
    A: Auditor,
{
    /// Queue `urls` for `report_id`. `concurrency` is clamped to at least 1.
    pub fn new(
        store: Arc<S>,
        auditor: Arc<A>,
        report_id: &str,
        urls: Vec<String>,
        concurrency: usize,
    ) -> Self {
        let total = urls.len();
        let pending = urls
            .into_iter()
            .map(|url| PendingUrl {
                url,
                attempts: 0,
                ready_at: None,
            })
            .collect();

        Self {
            auditor,
            aggregator: ResultAggregator::new(Arc::clone(&store), report_id),
            tracker: ProgressTracker::new(store, report_id, total),
            retry: RetryPolicy::default(),
            concurrency: concurrency.max(1),
            cancel_on_failure: false,
            state: Mutex::new(QueueState {
                pending,
                ..Default::default()
            }),
            failures: Mutex::new(Vec::new()),
            changed: Notify::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Cancel the run as soon as any failure is recorded.
    pub fn cancel_on_failure(mut self, enabled: bool) -> Self {
        self.cancel_on_failure = enabled;
        self
    }

    /// Drain the queue.
    ///
    /// Resolves once every URL has succeeded or been abandoned, or once
    /// `cancel` fires and the in-flight URLs have finished. Returns the
    /// first recorded failure if there was one, [`DispatchError::Cancelled`]
    /// if cancellation left URLs unprocessed, and the summary otherwise.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<QueueSummary, DispatchError> {
        let slots = {
            let state = self.state.lock().await;
            self.concurrency.min(state.pending.len()).max(1)
        };
        tracing::info!(
            report_id = %self.aggregator.report_id(),
            slots,
            "Dispatching URLs",
        );

        join_all((0..slots).map(|slot| self.worker_loop(slot, cancel))).await;

        let progress = self.tracker.snapshot().await;
        let state = self.state.lock().await;
        let mut failures = std::mem::take(&mut *self.failures.lock().await);

        if !failures.is_empty() {
            tracing::error!(
                report_id = %self.aggregator.report_id(),
                failures = failures.len(),
                completed = progress.completed,
                total = progress.total,
                "Dispatch finished with failures",
            );
            if !state.abandoned.is_empty() {
                tracing::error!(abandoned = ?state.abandoned, "URLs abandoned after retries");
            }
            return Err(failures.swap_remove(0));
        }
        if !state.pending.is_empty() {
            return Err(DispatchError::Cancelled {
                completed: progress.completed,
                total: progress.total,
            });
        }

        tracing::info!(
            report_id = %self.aggregator.report_id(),
            completed = progress.completed,
            attempts = state.attempts,
            "Dispatch finished",
        );
        Ok(QueueSummary {
            progress,
            attempts: state.attempts,
            max_in_flight: state.max_in_flight,
        })
    }

    async fn worker_loop(&self, slot: usize, cancel: &CancellationToken) {
        while let Some(task) = self.next_task(cancel).await {
            tracing::debug!(slot, url = %task.url, attempt = task.attempts + 1, "Auditing URL");
            let outcome = self.process(&task, cancel).await;
            self.finish(task, outcome, cancel).await;
        }
        tracing::debug!(slot, "Worker slot idle, exiting");
    }

    /// Take the first ready URL, waiting while retries are cooling down or
    /// other slots may still re-queue work. `None` means this slot is done.
    async fn next_task(&self, cancel: &CancellationToken) -> Option<PendingUrl> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            // Register for wake-ups before inspecting the state so a
            // notification sent in between is not lost.
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let wake_at = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let ready = state
                    .pending
                    .iter()
                    .position(|p| p.ready_at.map_or(true, |at| at <= now));

                if let Some(task) = ready.and_then(|i| state.pending.remove(i)) {
                    state.in_flight += 1;
                    state.attempts += 1;
                    state.max_in_flight = state.max_in_flight.max(state.in_flight);
                    return Some(task);
                }
                if state.pending.is_empty() && state.in_flight == 0 {
                    return None;
                }
                state.pending.iter().filter_map(|p| p.ready_at).min()
            };

            let cooldown = async {
                match wake_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = &mut notified => {}
                _ = cooldown => {}
            }
        }
    }

    async fn process(&self, task: &PendingUrl, cancel: &CancellationToken) -> Outcome {
        let attempts = task.attempts + 1;
        let issues = match self.auditor.audit(&task.url).await {
            Ok(issues) => issues,
            Err(error) if self.retry.allows_retry(attempts) => {
                return Outcome::Retry { attempts, error };
            }
            Err(error) => return Outcome::Abandon { attempts, error },
        };

        let record = self.aggregator.summarize(&task.url, &issues);
        let (persist_failures, (_, progress_failure)) = tokio::join!(
            self.aggregator.persist(&issues, &record),
            self.tracker.complete(&task.url, &record.codes),
        );

        for failure in persist_failures.into_iter().chain(progress_failure) {
            self.record_failure(failure, cancel).await;
        }
        Outcome::Done
    }

    /// Release the slot, re-queueing or abandoning the URL as decided.
    async fn finish(&self, task: PendingUrl, outcome: Outcome, cancel: &CancellationToken) {
        let mut abandoned = None;
        {
            let mut state = self.state.lock().await;
            match outcome {
                Outcome::Done => {}
                Outcome::Retry { attempts, error } => {
                    let delay = self.retry.delay_for(attempts);
                    tracing::warn!(
                        url = %task.url,
                        attempt = attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %error,
                        "Audit failed, re-queueing",
                    );
                    state.pending.push_back(PendingUrl {
                        url: task.url,
                        attempts,
                        ready_at: Some(Instant::now() + delay),
                    });
                }
                Outcome::Abandon { attempts, error } => {
                    tracing::error!(
                        url = %task.url,
                        attempts,
                        error = %error,
                        "Audit failed repeatedly, giving up on URL",
                    );
                    state.abandoned.push(task.url.clone());
                    abandoned = Some(DispatchError::RepeatedFailure {
                        url: task.url,
                        attempts,
                        source: Box::new(error),
                    });
                }
            }
            state.in_flight -= 1;
        }
        self.changed.notify_waiters();

        if let Some(failure) = abandoned {
            self.record_failure(failure, cancel).await;
        }
    }

    async fn record_failure(&self, failure: DispatchError, cancel: &CancellationToken) {
        self.failures.lock().await.push(failure);
        if self.cancel_on_failure && !cancel.is_cancelled() {
            tracing::warn!("Cancelling dispatch after first failure");
            cancel.cancel();
        }
    }
}
