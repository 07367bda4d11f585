use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::benchmarks::types::{BenchmarkResource, BenchmarkSpec};
use crate::cache::token_store::{TokenInfo, TokenStore};
use crate::config::loader::file_to_config;
use crate::config::settings::ClientConfig;
use crate::error::Result;
use crate::reconciler::{BenchmarkReconciler, ReconcileSettings};
use crate::router::RequestRouter;
use crate::sources::oauth2::OAuth2Issuer;
use crate::sources::IssueToken;
use crate::transport::AuthenticatedTransport;

/// Entry point for schema/state glue: one token cache, one transport, one reconciler.
///
/// Share it behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct BenchmarkClient<I: IssueToken = OAuth2Issuer> {
    tokens: Arc<TokenStore<I>>,
    transport: Arc<AuthenticatedTransport<I>>,
    reconciler: BenchmarkReconciler<I>,
}

impl BenchmarkClient<OAuth2Issuer> {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let issuer = OAuth2Issuer::new(&config.auth.token_url, config.auth.request_timeout())?;
        Self::with_issuer(issuer, config)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = file_to_config(path.as_ref()).await?;
        Ok(Self::from_config(&config)?)
    }
}

impl<I: IssueToken> BenchmarkClient<I> {
    /// Build a client around a custom token issuer.
    pub fn with_issuer(issuer: I, config: &ClientConfig) -> Result<Self> {
        debug!(base_url = %config.api.base_url, token_url = %config.auth.token_url, "building client");
        let tokens = Arc::new(TokenStore::new(
            issuer,
            config.auth.credentials(),
            config.auth.store_settings(),
        ));
        let router = RequestRouter::new(&config.api.base_url, config.api.request_timeout())?;
        Ok(Self::from_parts(tokens, router, config.reconcile.settings()))
    }

    pub fn from_parts(tokens: Arc<TokenStore<I>>, router: RequestRouter, settings: ReconcileSettings) -> Self {
        let transport = Arc::new(AuthenticatedTransport::new(tokens.clone(), router));
        let reconciler = BenchmarkReconciler::new(transport.clone(), settings);
        Self { tokens, transport, reconciler }
    }

    pub async fn create(&self, spec: &BenchmarkSpec, cancel: &CancellationToken) -> Result<BenchmarkResource> {
        self.reconciler.create(spec, cancel).await
    }

    pub async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        self.reconciler.delete(id, cancel).await
    }

    pub async fn list_benchmarks(&self) -> Result<Vec<BenchmarkResource>> {
        self.reconciler.list_benchmarks().await
    }

    pub async fn get_benchmark(&self, id: &str) -> Result<Option<BenchmarkResource>> {
        self.reconciler.get_benchmark(id).await
    }

    pub async fn get_valid_token(&self) -> Result<String> {
        self.tokens.get_valid_token().await
    }

    pub async fn clear_token(&self) {
        self.tokens.clear_token().await
    }

    pub async fn is_token_valid(&self) -> bool {
        self.tokens.is_token_valid().await
    }

    pub async fn token_info(&self) -> TokenInfo {
        self.tokens.token_info().await
    }

    /// Authenticated transport for endpoints outside the benchmark lifecycle.
    pub fn transport(&self) -> &Arc<AuthenticatedTransport<I>> {
        &self.transport
    }
}
