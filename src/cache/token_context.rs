use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::cache::token::Token;

/// Cached token together with the moment it stops being handed out.
#[derive(Debug, Clone)]
pub struct TokenContext {
    pub token: Token,
    /// request start, monotonic clock
    pub issued_at: Instant,
    pub issued_at_utc: DateTime<Utc>,
    /// token is refreshed once this instant is reached
    pub refresh_at: Instant,
}

impl TokenContext {
    pub fn new(
        token: Token,
        issued_at: Instant,
        issued_at_utc: DateTime<Utc>,
        safety_margin: Duration,
        fallback_validity: Duration,
    ) -> Self {
        let validity = validity_window(token.expires_in_seconds, safety_margin, fallback_validity);
        Self {
            token,
            issued_at,
            issued_at_utc,
            refresh_at: issued_at + validity,
        }
    }

    /// Check if token should be refreshed
    pub fn should_update(&self) -> bool {
        Instant::now() >= self.refresh_at
    }

    pub fn remaining(&self) -> Duration {
        self.refresh_at.saturating_duration_since(Instant::now())
    }

    pub fn refresh_at_utc(&self) -> DateTime<Utc> {
        let validity = self.refresh_at.duration_since(self.issued_at);
        self.issued_at_utc + chrono::Duration::from_std(validity).unwrap_or(chrono::Duration::zero())
    }
}

/// `expires_in - safety_margin`, or the fallback window when that is not positive.
pub fn validity_window(expires_in_seconds: u64, safety_margin: Duration, fallback_validity: Duration) -> Duration {
    Duration::from_secs(expires_in_seconds)
        .checked_sub(safety_margin)
        .filter(|window| !window.is_zero())
        .unwrap_or(fallback_validity)
}
