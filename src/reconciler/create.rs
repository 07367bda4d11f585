use http::{Method, StatusCode};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::benchmarks::types::{BenchmarkResource, BenchmarkSpec, CreateAccepted, SyncState};
use crate::error::{ClientError, Result};
use crate::observability::metrics::get_metrics;
use crate::reconciler::attempt::ReconciliationAttempt;
use crate::reconciler::{cancellable, BenchmarkReconciler, OP_CREATE};
use crate::router::RequestRouter;
use crate::sources::IssueToken;
use crate::transport::expect_status;

enum CreatePoll {
    Synced(BenchmarkResource),
    Failed,
}

impl<I: IssueToken> BenchmarkReconciler<I> {
    /// Create a benchmark and wait until the backend reports it `SYNCED`.
    ///
    /// `FAILED` triggers a delete-and-resubmit cycle (up to `max_self_heal`)
    /// drawing from the same poll budget as the first submission.
    pub async fn create(&self, spec: &BenchmarkSpec, cancel: &CancellationToken) -> Result<BenchmarkResource> {
        let started = Instant::now();
        let result = self.run_create(spec, cancel).await;
        self.record_outcome(OP_CREATE, started, &result).await;
        result
    }

    async fn run_create(&self, spec: &BenchmarkSpec, cancel: &CancellationToken) -> Result<BenchmarkResource> {
        let payload = serde_json::to_value(spec)
            .map_err(|e| ClientError::Config(format!("benchmark spec cannot be encoded: {}", e)))?;
        let mut attempt = ReconciliationAttempt::new(OP_CREATE, &self.settings);

        loop {
            let accepted_id = cancellable(cancel, self.submit_create(&payload)).await??;
            attempt.set_target(&accepted_id);
            info!(
                benchmark_id = %accepted_id,
                title = %spec.title,
                polls_used = attempt.polls(),
                "benchmark accepted, waiting for sync"
            );

            match self.poll_create(&mut attempt, cancel).await? {
                CreatePoll::Synced(resource) => {
                    info!(benchmark_id = %resource.id, polls = attempt.polls(), "benchmark synced");
                    return Ok(resource);
                }
                CreatePoll::Failed => {
                    let id = attempt.target_id().to_owned();
                    if attempt.self_heals() >= self.settings.max_self_heal {
                        error!(benchmark_id = %id, self_heals = attempt.self_heals(), "benchmark sync failed");
                        return Err(ClientError::SyncFailed { id, self_heals: attempt.self_heals() });
                    }
                    if attempt.exhausted() {
                        return Err(attempt.timeout_error());
                    }
                    let cycle = attempt.record_self_heal();
                    warn!(benchmark_id = %id, cycle, "benchmark sync failed, deleting and resubmitting");
                    get_metrics().await.self_heals.inc();
                    cancellable(cancel, self.submit_delete(&id)).await??;
                }
            }
        }
    }

    /// `POST /v2/benchmarks`, expecting 202 with the new id.
    async fn submit_create(&self, payload: &serde_json::Value) -> Result<String> {
        let url = self.transport.router().benchmarks_url()?;
        let response = self.transport.send(Method::POST, &url, Some(payload)).await?;
        let response = expect_status(&Method::POST, &url, response, StatusCode::ACCEPTED).await?;
        let body = response.text().await?;
        let accepted: CreateAccepted = RequestRouter::decode_body(body.clone())?;
        match accepted.resolved_id() {
            Some(id) => Ok(id.to_owned()),
            None => {
                error!(%url, "create accepted without a benchmark id");
                Err(ClientError::Decode {
                    message: "create response carries neither benchmarkId nor id".to_owned(),
                    body,
                })
            }
        }
    }

    async fn poll_create(&self, attempt: &mut ReconciliationAttempt, cancel: &CancellationToken) -> Result<CreatePoll> {
        let id = attempt.target_id().to_owned();
        let metrics = get_metrics().await;

        loop {
            if attempt.exhausted() {
                error!(benchmark_id = %id, polls = attempt.polls(), "benchmark did not sync in time");
                return Err(attempt.timeout_error());
            }
            self.wait_poll_interval(cancel).await?;
            let poll = attempt.record_poll();
            let listing = cancellable(cancel, self.fetch_listing()).await??;

            let Some(resource) = listing.find(&id) else {
                metrics.reconcile_polls.with_label_values(&[OP_CREATE, "ABSENT"]).inc();
                error!(benchmark_id = %id, poll, "accepted benchmark disappeared from listing");
                return Err(ClientError::NotFound {
                    id,
                    message: "benchmark vanished from the listing after being accepted".to_owned(),
                });
            };
            attempt.observe(&resource.sync_state);
            metrics
                .reconcile_polls
                .with_label_values(&[OP_CREATE, resource.sync_state.as_str()])
                .inc();

            match &resource.sync_state {
                SyncState::Pending => {
                    debug!(benchmark_id = %id, poll, "benchmark still pending");
                }
                SyncState::Synced => return Ok(CreatePoll::Synced(resource.clone())),
                SyncState::Failed => return Ok(CreatePoll::Failed),
                other => {
                    error!(benchmark_id = %id, state = %other, "unexpected state while creating");
                    return Err(ClientError::UnexpectedState {
                        operation: OP_CREATE,
                        id,
                        state: other.to_string(),
                    });
                }
            }
        }
    }
}
