//! Bearer-authenticated request execution with a single replay on 401.

use std::sync::Arc;

use http::{Method, StatusCode};
use reqwest::Response;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cache::token_store::TokenStore;
use crate::error::{ClientError, Result};
use crate::observability::metrics::get_metrics;
use crate::router::RequestRouter;
use crate::sources::oauth2::OAuth2Issuer;
use crate::sources::IssueToken;

#[derive(Debug)]
pub struct AuthenticatedTransport<I: IssueToken = OAuth2Issuer> {
    tokens: Arc<TokenStore<I>>,
    router: RequestRouter,
}

impl<I: IssueToken> AuthenticatedTransport<I> {
    pub fn new(tokens: Arc<TokenStore<I>>, router: RequestRouter) -> Self {
        Self { tokens, router }
    }

    pub fn router(&self) -> &RequestRouter {
        &self.router
    }

    /// Execute one logical request.
    ///
    /// On 401 the rejected token is dropped (unless a concurrent caller already
    /// replaced it) and the identical request is sent once more with a fresh
    /// token; a second 401 is a terminal `Auth` error.
    /// Statuses >= 500 become `Server` errors. Network failures are returned
    /// as-is without retry.
    pub async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Response> {
        let (response, rejected) = self.execute(&method, url, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return reject_server_error(&method, url, response).await;
        }

        warn!(%method, url, "request unauthorized, refreshing token and retrying once");
        drop(response);
        if !self.tokens.clear_token_if(&rejected).await {
            debug!(%method, url, "token already replaced by a concurrent caller");
        }
        get_metrics().await.unauthorized_retries.inc();

        let (response, _) = self.execute(&method, url, body).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            error!(%method, url, "request unauthorized after token refresh");
            return Err(ClientError::Auth {
                message: format!("{} {} rejected with 401 after token refresh", method, url),
                body: Some(body),
            });
        }
        reject_server_error(&method, url, response).await
    }

    /// Send once with the current token. Returns the token used alongside the response.
    async fn execute(&self, method: &Method, url: &str, body: Option<&Value>) -> Result<(Response, String)> {
        let token = self.tokens.get_valid_token().await?;
        let response = self
            .router
            .build_request(method, url, body)
            .bearer_auth(&token)
            .send()
            .await
            .inspect_err(|e| error!(%method, url, error = %e, "request failed"))?;

        let status = response.status();
        debug!(%method, url, status = status.as_u16(), "response received");
        get_metrics()
            .await
            .http_requests
            .with_label_values(&[method.as_str(), status.as_str()])
            .inc();
        Ok((response, token))
    }
}

async fn reject_server_error(method: &Method, url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_server_error() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!(%method, url, status = status.as_u16(), "server error");
    Err(ClientError::server(method, url, status, body))
}

/// Pass the response through when it carries `expected`, otherwise turn it into an `Http` error.
pub async fn expect_status(method: &Method, url: &str, response: Response, expected: StatusCode) -> Result<Response> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(%method, url, status = status.as_u16(), expected = expected.as_u16(), "unexpected status");
    Err(ClientError::http(method, url, status, body))
}
