use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::config::settings::{ClientConfig, LoggingConfig};
use crate::config::validator;

static ENV_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Load, expand and validate a YAML config file
pub async fn file_to_config(path: &Path) -> Result<ClientConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read config file {}", path.display()))?;

    let expanded = expand_env_vars(&content);
    parse_config(&expanded).map_err(|e| anyhow!("Invalid config format: {}", e))
}

pub fn parse_config(content: &str) -> Result<ClientConfig> {
    let mut client_config: ClientConfig = serde_yaml::from_str(content)
        .inspect_err(|e| error!("parse config error: {}", e))?;

    // Apply defaults
    if client_config.logging.is_none() {
        client_config.logging = Some(LoggingConfig::default());
    }

    debug!("validation config ...");
    validator::validate_client_config(&client_config).map_err(|errors| {
        errors.iter().for_each(|e| error!("config: {}", e));
        anyhow!("config validation failed: {}", errors.join("; "))
    })?;

    Ok(client_config)
}

/// Replace `${VAR}` and `${VAR:default}` with environment values.
pub fn expand_env_vars(input: &str) -> String {
    let re = ENV_PATTERN
        .get_or_init(|| Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("valid env pattern"));
    re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}
