// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, post};
use axum::Json;
use serde_json::Value;

use crate::cache::token::Token;
use crate::cache::token_store::{TokenStore, TokenStoreSettings};
use crate::client::BenchmarkClient;
use crate::error::{ClientError, Result};
use crate::reconciler::ReconcileSettings;
use crate::router::RequestRouter;
use crate::sources::{Credentials, IssueToken};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn test_credentials() -> Credentials {
    Credentials::new("client-id", "client-secret", Some("read write".to_owned()))
}

/// Issuer stub handing out `token-1`, `token-2`, ... and counting calls.
#[derive(Debug, Clone)]
pub struct CountingIssuer {
    pub calls: Arc<AtomicUsize>,
    pub expires_in: u64,
    pub delay: Duration,
    pub fail: bool,
}

impl CountingIssuer {
    pub fn new(expires_in: u64) -> Self {
        Self { calls: Arc::new(AtomicUsize::new(0)), expires_in, delay: Duration::ZERO, fail: false }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IssueToken for CountingIssuer {
    async fn issue(&self, _credentials: &Credentials) -> Result<Token> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(ClientError::Auth {
                message: "token endpoint returned 401 Unauthorized".to_owned(),
                body: Some(r#"{"error":"invalid_client"}"#.to_owned()),
            });
        }
        Ok(Token::new(format!("token-{n}"), self.expires_in, vec!["read".to_owned()]))
    }
}

pub fn token_store(issuer: CountingIssuer) -> TokenStore<CountingIssuer> {
    TokenStore::new(issuer, test_credentials(), TokenStoreSettings::default())
}

pub fn fast_settings(max_attempts: u32) -> ReconcileSettings {
    ReconcileSettings {
        poll_interval: Duration::from_millis(5),
        max_attempts,
        max_self_heal: 1,
    }
}

pub fn build_client(addr: SocketAddr, issuer: CountingIssuer, settings: ReconcileSettings) -> BenchmarkClient<CountingIssuer> {
    let tokens = Arc::new(token_store(issuer));
    let router = RequestRouter::new(&format!("http://{}/api", addr), Duration::from_secs(5)).unwrap();
    BenchmarkClient::from_parts(tokens, router, settings)
}

pub fn listing(entries: &[(&str, &str)]) -> Value {
    let benchmarks: Vec<Value> = entries
        .iter()
        .map(|(id, state)| json!({"id": id, "title": "CIS Level 1", "syncState": state}))
        .collect();
    json!({ "benchmarks": benchmarks })
}

/// Scripted platform: listings are served in order, the last one repeats.
#[derive(Clone)]
pub struct FakePlatform {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub authorizations: Arc<Mutex<Vec<String>>>,
    listings: Arc<Mutex<VecDeque<Value>>>,
    next_id: Arc<AtomicUsize>,
    pub create_status: StatusCode,
    pub delete_status: StatusCode,
    /// keys carrying the new id in the create response
    pub id_fields: &'static [&'static str],
}

impl FakePlatform {
    pub fn new(listings: Vec<Value>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            authorizations: Arc::new(Mutex::new(Vec::new())),
            listings: Arc::new(Mutex::new(listings.into())),
            next_id: Arc::new(AtomicUsize::new(0)),
            create_status: StatusCode::ACCEPTED,
            delete_status: StatusCode::NO_CONTENT,
            id_fields: &["benchmarkId"],
        }
    }

    pub async fn spawn(&self) -> (JoinHandle<()>, SocketAddr) {
        let router = Router::new()
            .route("/api/v2/benchmarks", post(create_benchmark).get(list_benchmarks))
            .route("/api/v1/benchmarks/{id}", delete(delete_benchmark))
            .with_state(self.clone());
        spawn_axum(router).await
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|call| call.starts_with(prefix)).count()
    }

    fn record(&self, call: String, headers: &HeaderMap) {
        self.calls.lock().unwrap().push(call);
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        self.authorizations.lock().unwrap().push(authorization);
    }
}

async fn create_benchmark(
    State(platform): State<FakePlatform>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    platform.record("POST /v2/benchmarks".to_owned(), &headers);
    let n = platform.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    let mut accepted = json!({"title": body["title"]});
    for field in platform.id_fields {
        accepted[*field] = json!(format!("bench-{n}"));
    }
    (platform.create_status, Json(accepted))
}

async fn list_benchmarks(State(platform): State<FakePlatform>, headers: HeaderMap) -> Json<Value> {
    platform.record("GET /v2/benchmarks".to_owned(), &headers);
    let mut listings = platform.listings.lock().unwrap();
    let current = if listings.len() > 1 {
        listings.pop_front().unwrap_or_else(|| listing(&[]))
    } else {
        listings.front().cloned().unwrap_or_else(|| listing(&[]))
    };
    Json(current)
}

async fn delete_benchmark(
    State(platform): State<FakePlatform>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    platform.record(format!("DELETE /v1/benchmarks/{id}"), &headers);
    platform.delete_status
}
