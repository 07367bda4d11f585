use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, error};

use crate::cache::token::Token;
use crate::error::{ClientError, Result};
use crate::parser::token_response::parse_token_response;
use crate::sources::{Credentials, IssueToken};

const GRANT_TYPE: &str = "client_credentials";

/// OAuth2 client-credentials exchange against a token endpoint.
#[derive(Debug, Clone)]
pub struct OAuth2Issuer {
    pub token_url: String,
    client: Client,
}

impl OAuth2Issuer {
    pub fn new(token_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(ClientError::Network)?;
        Ok(Self { token_url: token_url.into(), client })
    }
}

impl IssueToken for OAuth2Issuer {
    async fn issue(&self, credentials: &Credentials) -> Result<Token> {
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", GRANT_TYPE),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ];
        if let Some(scope) = &credentials.scope {
            form.push(("scope", scope.as_str()));
        }

        debug!(token_url = %self.token_url, client_id = %credentials.client_id, "requesting token");
        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ClientError::auth(format!("token request to {} failed: {}", self.token_url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::auth(format!("failed to read token response: {}", e)))?;

        if status != StatusCode::OK {
            error!(status = status.as_u16(), "token request rejected");
            return Err(ClientError::Auth {
                message: format!("token endpoint returned {}", status),
                body: Some(body),
            });
        }

        parse_token_response(&body)
    }
}
