use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::settings::{LogFormat, LoggingConfig};

const FALLBACK_LEVEL: &str = "info";

/// Install the global subscriber for a host process.
///
/// The library never calls this itself. Returns `false` when a subscriber
/// was already installed; the existing one is kept.
pub fn init_logging(cfg: &LoggingConfig) -> bool {
    let env_filter = EnvFilter::try_new(&cfg.level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL));

    let format_layer = match cfg.format {
        // one flat object per line for log collectors
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .flatten_event(true)
            .with_current_span(false)
            .with_ansi(false)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_timer(UtcTime::rfc_3339())
            .with_target(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(format_layer)
        .with(env_filter)
        .try_init()
        .is_ok()
}
