//! Error types surfaced by the client core.
//!
//! Every failure is a [`ClientError`] variant so callers can branch on the
//! kind (e.g. `NotFound` vs `Timeout`) instead of parsing messages.

use http::StatusCode;
use thiserror::Error;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Token issuance or validation failed. `body` keeps the raw response for diagnostics.
    #[error("authentication failed: {message}")]
    Auth {
        message: String,
        body: Option<String>,
    },

    /// Resource vanished when expected present.
    #[error("benchmark '{id}' not found: {message}")]
    NotFound { id: String, message: String },

    /// Attempt budget exhausted.
    #[error("{operation} of benchmark '{id}' timed out after {attempts} polls (last state: {last_state})")]
    Timeout {
        operation: &'static str,
        id: String,
        attempts: u32,
        last_state: String,
    },

    /// Backend reported a state outside the vocabulary expected at this point.
    #[error("benchmark '{id}' is in unexpected state '{state}' during {operation}")]
    UnexpectedState {
        operation: &'static str,
        id: String,
        state: String,
    },

    /// Sync kept failing after the self-heal cycles were spent.
    #[error("benchmark '{id}' failed to sync after {self_heals} resubmission(s)")]
    SyncFailed { id: String, self_heals: u32 },

    #[error("benchmark '{id}' reported DELETE_FAILED")]
    DeleteFailed { id: String },

    /// 5xx from the platform. Likely transient, left to the caller to retry.
    #[error("server error {status} for {method} {url}: {body}")]
    Server {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// Non-success status the caller did not expect.
    #[error("unexpected status {status} for {method} {url}: {body}")]
    Http {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode response: {message}")]
    Decode { message: String, body: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn auth(message: impl Into<String>) -> Self {
        ClientError::Auth {
            message: message.into(),
            body: None,
        }
    }

    pub fn server(method: &http::Method, url: &str, status: StatusCode, body: String) -> Self {
        ClientError::Server {
            method: method.to_string(),
            url: url.to_owned(),
            status: status.as_u16(),
            body,
        }
    }

    pub fn http(method: &http::Method, url: &str, status: StatusCode, body: String) -> Self {
        ClientError::Http {
            method: method.to_string(),
            url: url.to_owned(),
            status: status.as_u16(),
            body,
        }
    }

    /// Stable label used for branching in callers and as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Auth { .. } => "auth",
            ClientError::NotFound { .. } => "not_found",
            ClientError::Timeout { .. } => "timeout",
            ClientError::UnexpectedState { .. } => "unexpected_state",
            ClientError::SyncFailed { .. } => "sync_failed",
            ClientError::DeleteFailed { .. } => "delete_failed",
            ClientError::Server { .. } => "server",
            ClientError::Http { .. } => "http",
            ClientError::Network(_) => "network",
            ClientError::Decode { .. } => "decode",
            ClientError::Cancelled => "cancelled",
            ClientError::Config(_) => "config",
        }
    }

    /// Whether a higher layer may reasonably retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Server { .. } | ClientError::Timeout { .. } => true,
            ClientError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
