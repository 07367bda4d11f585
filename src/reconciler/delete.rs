use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::benchmarks::types::SyncState;
use crate::error::{ClientError, Result};
use crate::observability::metrics::get_metrics;
use crate::reconciler::attempt::ReconciliationAttempt;
use crate::reconciler::{cancellable, BenchmarkReconciler, OP_DELETE};
use crate::sources::IssueToken;

impl<I: IssueToken> BenchmarkReconciler<I> {
    /// Delete a benchmark and wait until it is gone from the listing.
    ///
    /// An id that is not listed counts as deleted.
    pub async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        let started = Instant::now();
        let result = self.run_delete(id, cancel).await;
        self.record_outcome(OP_DELETE, started, &result).await;
        result
    }

    async fn run_delete(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        let mut attempt = ReconciliationAttempt::new(OP_DELETE, &self.settings);
        attempt.set_target(id);
        let metrics = get_metrics().await;

        cancellable(cancel, self.submit_delete(id)).await??;
        info!(
            benchmark_id = id,
            max_polls = self.settings.max_attempts,
            "delete submitted, waiting for removal"
        );

        loop {
            if attempt.exhausted() {
                error!(benchmark_id = id, polls = attempt.polls(), "benchmark was not removed in time");
                return Err(attempt.timeout_error());
            }
            self.wait_poll_interval(cancel).await?;
            let poll = attempt.record_poll();
            let listing = cancellable(cancel, self.fetch_listing()).await??;

            let Some(resource) = listing.find(id) else {
                metrics.reconcile_polls.with_label_values(&[OP_DELETE, "ABSENT"]).inc();
                info!(benchmark_id = id, poll, "benchmark removed");
                return Ok(());
            };
            attempt.observe(&resource.sync_state);
            metrics
                .reconcile_polls
                .with_label_values(&[OP_DELETE, resource.sync_state.as_str()])
                .inc();

            match &resource.sync_state {
                SyncState::Deleting if attempt.exhausted() => {
                    debug!(benchmark_id = id, poll, "benchmark still deleting on the last poll");
                }
                SyncState::Deleting => {
                    // backend only makes progress when the delete is resubmitted
                    debug!(benchmark_id = id, poll, "benchmark still deleting, resubmitting delete");
                    cancellable(cancel, self.submit_delete(id)).await??;
                }
                SyncState::DeleteFailed => {
                    error!(benchmark_id = id, poll, "backend reported DELETE_FAILED");
                    return Err(ClientError::DeleteFailed { id: id.to_owned() });
                }
                other => {
                    error!(benchmark_id = id, state = %other, "benchmark still present after delete");
                    return Err(ClientError::UnexpectedState {
                        operation: OP_DELETE,
                        id: id.to_owned(),
                        state: other.to_string(),
                    });
                }
            }
        }
    }
}
