use serde::Deserialize;
use tracing::{debug, error};

use crate::cache::token::Token;
use crate::error::{ClientError, Result};

/// Client-credentials grant response. Unknown fields (`token_type`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    scope: Option<String>,
}

/// Parse a token endpoint body into a [`Token`].
///
/// Malformed JSON or missing fields yield `ClientError::Auth` carrying the raw body.
pub fn parse_token_response(body: &str) -> Result<Token> {
    let response: TokenResponse = serde_json::from_str(body).map_err(|e| {
        error!(error = %e, "token response is not valid");
        ClientError::Auth {
            message: format!("malformed token response: {}", e),
            body: Some(body.to_owned()),
        }
    })?;

    if response.access_token.is_empty() {
        return Err(ClientError::Auth {
            message: "token response carries an empty access_token".to_owned(),
            body: Some(body.to_owned()),
        });
    }

    let scopes = parse_scopes(response.scope.as_deref());
    debug!(expires_in = response.expires_in, scopes = ?scopes, "token response parsed");
    Ok(Token::new(response.access_token, response.expires_in, scopes))
}

/// Split a space-delimited scope string. Absent or blank means unrestricted (empty list).
pub fn parse_scopes(scope: Option<&str>) -> Vec<String> {
    scope
        .map(|s| s.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scopes_and_lifetime() {
        let token = parse_token_response(
            r#"{"access_token":"abc","expires_in":3600,"scope":"read  write","token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(token.value, "abc");
        assert_eq!(token.expires_in_seconds, 3600);
        assert_eq!(token.scopes, vec!["read".to_string(), "write".to_string()]);
    }

    #[test]
    fn missing_or_blank_scope_is_unrestricted() {
        let token = parse_token_response(r#"{"access_token":"abc","expires_in":60}"#).unwrap();
        assert!(token.scopes.is_empty());
        assert!(parse_scopes(Some("   ")).is_empty());
    }

    #[test]
    fn malformed_body_is_auth_error_with_body() {
        let err = parse_token_response(r#"{"access_token":"abc"}"#).unwrap_err();
        match err {
            ClientError::Auth { body, .. } => assert_eq!(body.as_deref(), Some(r#"{"access_token":"abc"}"#)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_access_token_is_rejected() {
        let err = parse_token_response(r#"{"access_token":"","expires_in":60}"#).unwrap_err();
        assert_eq!(err.kind(), "auth");
    }
}
