//! # Benchmark Agent
//!
//! Client core for a device-management platform API: a shared OAuth2
//! client-credentials token cache, a transport that replays a request once
//! after a 401, and a reconciler that creates and deletes benchmarks whose
//! effect the backend applies asynchronously.
//!
//! Modules:
//! - `cache`: token record and the single-slot token store
//! - `sources`: token issuers (OAuth2 client credentials)
//! - `parser`: token endpoint response parsing
//! - `transport`: bearer-authenticated requests with 401 replay
//! - `router`: endpoint paths and JSON encoding
//! - `reconciler`: create/delete polling state machines
//! - `config`: YAML configuration, defaults and validation
//! - `benchmarks`: wire model of the benchmark resource
//! - `client`: `BenchmarkClient`, the facade tying it together
//! - `observability`: prometheus counters for tokens, requests and polls

pub mod benchmarks;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod observability;
pub mod parser;
pub mod reconciler;
pub mod router;
pub mod sources;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::benchmarks::types::{BenchmarkResource, BenchmarkSpec, SyncState};
pub use crate::cache::token_store::{TokenInfo, TokenStore};
pub use crate::client::BenchmarkClient;
pub use crate::config::settings::ClientConfig;
pub use crate::error::{ClientError, Result};
pub use crate::sources::{Credentials, IssueToken};
pub use tokio_util::sync::CancellationToken;
