use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process-wide `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token metrics
    pub token_refreshes: IntCounterVec,
    pub token_cache_hits: IntCounter,
    pub token_clears: IntCounter,

    // Transport metrics
    pub http_requests: IntCounterVec,
    pub unauthorized_retries: IntCounter,

    // Reconciler metrics
    pub reconcile_polls: IntCounterVec,
    pub reconcile_outcomes: IntCounterVec,
    pub reconcile_duration: HistogramVec,
    pub self_heals: IntCounter,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry =
            Registry::new_custom(Some("benchmarkagent".into()), None).expect("valid registry prefix");

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token
            token_refreshes: IntCounterVec::new(
                Opts::new("token_refreshes_total", "Token issuer calls by outcome"),
                &["outcome"],
            )
            .expect("metric"),
            token_cache_hits: IntCounter::new("token_cache_hits_total", "Tokens served from cache")
                .expect("metric"),
            token_clears: IntCounter::new("token_clears_total", "Token invalidations")
                .expect("metric"),

            // Transport
            http_requests: IntCounterVec::new(
                Opts::new("http_requests_total", "Outbound API requests"),
                &["method", "status"],
            )
            .expect("metric"),
            unauthorized_retries: IntCounter::new(
                "http_unauthorized_retries_total",
                "Requests replayed after a 401",
            )
            .expect("metric"),

            // Reconciler
            reconcile_polls: IntCounterVec::new(
                Opts::new("reconcile_polls_total", "Listing polls by operation and observed state"),
                &["operation", "state"],
            )
            .expect("metric"),
            reconcile_outcomes: IntCounterVec::new(
                Opts::new("reconcile_outcomes_total", "Finished reconciliations"),
                &["operation", "outcome"],
            )
            .expect("metric"),
            reconcile_duration: HistogramVec::new(
                HistogramOpts::new("reconcile_duration_seconds", "Reconciliation wall time")
                    .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
                &["operation"],
            )
            .expect("metric"),
            self_heals: IntCounter::new(
                "reconcile_self_heals_total",
                "Delete-and-resubmit cycles after FAILED",
            )
            .expect("metric"),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_refreshes.clone())).expect("register");
        reg.register(Box::new(metrics.token_cache_hits.clone())).expect("register");
        reg.register(Box::new(metrics.token_clears.clone())).expect("register");
        reg.register(Box::new(metrics.http_requests.clone())).expect("register");
        reg.register(Box::new(metrics.unauthorized_retries.clone())).expect("register");
        reg.register(Box::new(metrics.reconcile_polls.clone())).expect("register");
        reg.register(Box::new(metrics.reconcile_outcomes.clone())).expect("register");
        reg.register(Box::new(metrics.reconcile_duration.clone())).expect("register");
        reg.register(Box::new(metrics.self_heals.clone())).expect("register");

        metrics
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn gather_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
