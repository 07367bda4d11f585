//! Create/delete of benchmarks whose effect the backend applies asynchronously.
//!
//! Both operations submit a mutation and then poll the listing endpoint until
//! the benchmark reaches a terminal state or the attempt budget runs out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::benchmarks::types::{BenchmarkList, BenchmarkResource};
use crate::error::{ClientError, Result};
use crate::observability::metrics::get_metrics;
use crate::router::RequestRouter;
use crate::sources::oauth2::OAuth2Issuer;
use crate::sources::IssueToken;
use crate::transport::{expect_status, AuthenticatedTransport};

pub mod attempt;
pub mod create;
pub mod delete;

pub const OP_CREATE: &str = "create";
pub const OP_DELETE: &str = "delete";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 24;
pub const DEFAULT_MAX_SELF_HEAL: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub struct ReconcileSettings {
    pub poll_interval: Duration,
    /// listing polls per create/delete call, shared across self-heal cycles
    pub max_attempts: u32,
    /// delete-and-resubmit cycles allowed after FAILED
    pub max_self_heal: u32,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_self_heal: DEFAULT_MAX_SELF_HEAL,
        }
    }
}

#[derive(Debug)]
pub struct BenchmarkReconciler<I: IssueToken = OAuth2Issuer> {
    transport: Arc<AuthenticatedTransport<I>>,
    settings: ReconcileSettings,
}

impl<I: IssueToken> BenchmarkReconciler<I> {
    pub fn new(transport: Arc<AuthenticatedTransport<I>>, settings: ReconcileSettings) -> Self {
        Self { transport, settings }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    pub async fn list_benchmarks(&self) -> Result<Vec<BenchmarkResource>> {
        Ok(self.fetch_listing().await?.benchmarks)
    }

    /// Look a benchmark up in the listing. `None` when absent.
    pub async fn get_benchmark(&self, id: &str) -> Result<Option<BenchmarkResource>> {
        let listing = self.fetch_listing().await?;
        Ok(listing.find(id).cloned())
    }

    async fn fetch_listing(&self) -> Result<BenchmarkList> {
        let url = self.transport.router().benchmarks_url()?;
        let response = self.transport.send(Method::GET, &url, None).await?;
        let response = expect_status(&Method::GET, &url, response, StatusCode::OK).await?;
        RequestRouter::decode(response).await
    }

    /// Issue `DELETE /v1/benchmarks/{id}`. A 404 means the benchmark is already gone.
    async fn submit_delete(&self, id: &str) -> Result<()> {
        let url = self.transport.router().benchmark_url(id)?;
        let response = self.transport.send(Method::DELETE, &url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(benchmark_id = id, "delete target already absent");
            return Ok(());
        }
        expect_status(&Method::DELETE, &url, response, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    async fn wait_poll_interval(&self, cancel: &CancellationToken) -> Result<()> {
        cancellable(cancel, tokio::time::sleep(self.settings.poll_interval)).await
    }

    async fn record_outcome<T>(&self, operation: &'static str, started: Instant, result: &Result<T>) {
        let metrics = get_metrics().await;
        let outcome = match result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics.reconcile_outcomes.with_label_values(&[operation, outcome]).inc();
        metrics
            .reconcile_duration
            .with_label_values(&[operation])
            .observe(started.elapsed().as_secs_f64());
        info!(operation, outcome, elapsed_ms = started.elapsed().as_millis() as u64, "reconciliation finished");
    }
}

/// Race `future` against cancellation; cancellation wins ties.
pub async fn cancellable<F: Future>(cancel: &CancellationToken, future: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        output = future => Ok(output),
    }
}
