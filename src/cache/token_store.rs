use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::cache::token_context::TokenContext;
use crate::error::Result;
use crate::observability::metrics::get_metrics;
use crate::sources::oauth2::OAuth2Issuer;
use crate::sources::{Credentials, IssueToken};

pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(60);
pub const DEFAULT_FALLBACK_VALIDITY: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy)]
pub struct TokenStoreSettings {
    /// subtracted from `expires_in` against clock skew and transit latency
    pub safety_margin: Duration,
    /// used when `expires_in - safety_margin` is not positive
    pub fallback_validity: Duration,
}

impl Default for TokenStoreSettings {
    fn default() -> Self {
        Self {
            safety_margin: DEFAULT_SAFETY_MARGIN,
            fallback_validity: DEFAULT_FALLBACK_VALIDITY,
        }
    }
}

/// Read-only snapshot of the cached token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub has_token: bool,
    pub valid: bool,
    pub scopes: Vec<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub refresh_at: Option<DateTime<Utc>>,
    pub remaining: Duration,
}

/// Single-slot bearer token cache.
///
/// Readers share a read lock. A refresh holds the write lock for the whole
/// issuer call, so concurrent refreshes serialise and the re-check under the
/// write lock lets every waiter reuse the token fetched by the first one.
#[derive(Debug)]
pub struct TokenStore<I: IssueToken = OAuth2Issuer> {
    issuer: I,
    credentials: Credentials,
    settings: TokenStoreSettings,
    inner: RwLock<Option<TokenContext>>,
}

impl<I: IssueToken> TokenStore<I> {
    pub fn new(issuer: I, credentials: Credentials, settings: TokenStoreSettings) -> Self {
        Self {
            issuer,
            credentials,
            settings,
            inner: RwLock::new(None),
        }
    }

    /// Return a token that is not expired at the instant of the check,
    /// calling the issuer only when the cache is empty or stale.
    pub async fn get_valid_token(&self) -> Result<String> {
        let metrics = get_metrics().await;

        // fast path
        if let Some(value) = Self::cached_value(&*self.inner.read().await) {
            metrics.token_cache_hits.inc();
            return Ok(value);
        }

        // slow path
        let mut slot = self.inner.write().await;
        if let Some(value) = Self::cached_value(&slot) {
            debug!("token refreshed by a concurrent caller");
            metrics.token_cache_hits.inc();
            return Ok(value);
        }

        let issued_at = Instant::now();
        let issued_at_utc = Utc::now();
        let token = self.issuer.issue(&self.credentials).await.inspect_err(|e| {
            error!(error = %e, client_id = %self.credentials.client_id, "token refresh failed");
            metrics.token_refreshes.with_label_values(&["error"]).inc();
        })?;

        let context = TokenContext::new(
            token,
            issued_at,
            issued_at_utc,
            self.settings.safety_margin,
            self.settings.fallback_validity,
        );
        info!(
            expires_in = context.token.expires_in_seconds,
            refresh_at = %context.refresh_at_utc(),
            scopes = ?context.token.scopes,
            "token refreshed"
        );
        metrics.token_refreshes.with_label_values(&["ok"]).inc();

        let value = context.token.value.clone();
        *slot = Some(context);
        Ok(value)
    }

    /// Drop the cached token; the next `get_valid_token` fetches a new one.
    pub async fn clear_token(&self) {
        let mut slot = self.inner.write().await;
        if slot.take().is_some() {
            debug!("cached token cleared");
        }
        get_metrics().await.token_clears.inc();
    }

    /// Drop the cached token only while it is still `stale`.
    ///
    /// Returns `false` when another caller already replaced or dropped it,
    /// so a late 401 never discards a freshly issued token.
    pub async fn clear_token_if(&self, stale: &str) -> bool {
        let mut slot = self.inner.write().await;
        let matches = slot.as_ref().is_some_and(|context| context.token.value == stale);
        if matches {
            slot.take();
            debug!("rejected token cleared");
            get_metrics().await.token_clears.inc();
        }
        matches
    }

    pub async fn is_token_valid(&self) -> bool {
        Self::cached_value(&*self.inner.read().await).is_some()
    }

    pub async fn token_info(&self) -> TokenInfo {
        let slot = self.inner.read().await;
        match slot.as_ref() {
            Some(context) => TokenInfo {
                has_token: true,
                valid: !context.should_update(),
                scopes: context.token.scopes.clone(),
                issued_at: Some(context.issued_at_utc),
                refresh_at: Some(context.refresh_at_utc()),
                remaining: context.remaining(),
            },
            None => TokenInfo {
                has_token: false,
                valid: false,
                scopes: Vec::new(),
                issued_at: None,
                refresh_at: None,
                remaining: Duration::ZERO,
            },
        }
    }

    fn cached_value(slot: &Option<TokenContext>) -> Option<String> {
        slot.as_ref()
            .filter(|context| !context.should_update())
            .map(|context| context.token.value.clone())
    }
}
