//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks URLs, credentials, polling budget and logging invariants

use tracing::info;
use url::Url;

use crate::config::settings::{ApiConfig, AuthConfig, ClientConfig, LoggingConfig, ReconcileConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_client_config(cfg: &ClientConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_api(&cfg.api, &mut errors);
    validate_auth(&cfg.auth, &mut errors);
    validate_reconcile(&cfg.reconcile, &mut errors);
    if let Some(logging) = &cfg.logging {
        validate_logging(logging, &mut errors);
    }

    if errors.is_empty() {
        info!("config validation passed");
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_api(api: &ApiConfig, errors: &mut Vec<String>) {
    validate_http_url("api.base_url", &api.base_url, errors);
    if api.request_timeout_ms == Some(0) {
        errors.push("api.request_timeout_ms must be > 0".to_string());
    }
}

fn validate_auth(auth: &AuthConfig, errors: &mut Vec<String>) {
    validate_http_url("auth.token_url", &auth.token_url, errors);
    if auth.client_id.trim().is_empty() {
        errors.push("auth.client_id must not be empty".to_string());
    }
    if auth.client_secret.trim().is_empty() {
        errors.push("auth.client_secret must not be empty".to_string());
    }
    if auth.fallback_validity_seconds == Some(0) {
        errors.push("auth.fallback_validity_seconds must be > 0".to_string());
    }
    if auth.request_timeout_ms == Some(0) {
        errors.push("auth.request_timeout_ms must be > 0".to_string());
    }
}

fn validate_reconcile(reconcile: &ReconcileConfig, errors: &mut Vec<String>) {
    if reconcile.max_attempts == Some(0) {
        errors.push("reconcile.max_attempts must be > 0".to_string());
    }
    if reconcile.poll_interval_ms == Some(0) {
        errors.push("reconcile.poll_interval_ms must be > 0".to_string());
    }
}

fn validate_logging(logging: &LoggingConfig, errors: &mut Vec<String>) {
    if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
        errors.push(format!(
            "logging.level '{}' is invalid; allowed: {}",
            logging.level,
            LOG_LEVELS.join(", ")
        ));
    }
}

fn validate_http_url(field: &str, value: &str, errors: &mut Vec<String>) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!("{} must use http or https, got '{}'", field, url.scheme())),
        Err(e) => errors.push(format!("{} '{}' is not a valid URL: {}", field, value, e)),
    }
}
