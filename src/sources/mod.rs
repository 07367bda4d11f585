/// Token sources
///
/// Anything able to produce a fresh [`Token`] for a set of client credentials.
use std::fmt;
use std::future::Future;

use crate::cache::token::Token;
use crate::error::Result;

pub mod oauth2;

pub trait IssueToken: Send + Sync {
    /// Perform exactly one token request. No retry.
    fn issue(&self, credentials: &Credentials) -> impl Future<Output = Result<Token>> + Send;
}

/// Client-credentials grant parameters.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>, scope: Option<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.filter(|s| !s.trim().is_empty()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("scope", &self.scope)
            .finish()
    }
}
