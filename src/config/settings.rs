use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::token_store::TokenStoreSettings;
use crate::reconciler::ReconcileSettings;
use crate::sources::Credentials;

pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TOKEN_TIMEOUT_MS: u64 = 10_000;

/// ================================
/// Full client configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: Option<u64>,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(DEFAULT_API_TIMEOUT_MS))
    }
}

/// ================================
/// OAuth2 client credentials
/// ================================
#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
    /// subtracted from `expires_in` before a token is considered stale
    pub safety_margin_seconds: Option<u64>,
    /// validity used when `expires_in - safety_margin_seconds` is not positive
    pub fallback_validity_seconds: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

impl AuthConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.client_id, &self.client_secret, self.scope.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(DEFAULT_TOKEN_TIMEOUT_MS))
    }

    pub fn store_settings(&self) -> TokenStoreSettings {
        let defaults = TokenStoreSettings::default();
        TokenStoreSettings {
            safety_margin: self
                .safety_margin_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.safety_margin),
            fallback_validity: self
                .fallback_validity_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.fallback_validity),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("scope", &self.scope)
            .field("safety_margin_seconds", &self.safety_margin_seconds)
            .field("fallback_validity_seconds", &self.fallback_validity_seconds)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// ================================
/// Polling budget
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReconcileConfig {
    pub poll_interval_ms: Option<u64>,
    /// invariant: > 0
    pub max_attempts: Option<u32>,
    pub max_self_heal: Option<u32>,
}

impl ReconcileConfig {
    pub fn settings(&self) -> ReconcileSettings {
        let defaults = ReconcileSettings::default();
        ReconcileSettings {
            poll_interval: self
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            max_self_heal: self.max_self_heal.unwrap_or(defaults.max_self_heal),
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

/// Used when the config file has no `logging` section; `LOG_FORMAT` picks the format.
impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::from_env())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON; anything else, or unset, is compact.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}
