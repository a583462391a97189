//! Tracing subscriber setup for binaries and tools built on elo.
//!
//! Environment variables:
//!   LOG_FORMAT  - "json" or "text" (default: "text")
//!   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
//!   RUST_LOG    - standard env filter (default: "elo_core=info,elo_vault=info")

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use elo_core::{Error, Result};

pub const DEFAULT_FILTER: &str = "elo_core=info,elo_vault=info";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Install the global subscriber.
///
/// Fails when a global subscriber is already set.
pub fn init_tracing() -> Result<()> {
    let log_format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).try_init()
        }
    };

    result.map_err(|e| Error::Internal(format!("tracing init failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_env_value() {
        assert_eq!(LogFormat::from_env_value(None), LogFormat::Text);
        assert_eq!(LogFormat::from_env_value(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some(" json ")), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some("pretty")), LogFormat::Text);
    }

    #[test]
    fn test_init_tracing_twice_fails() {
        let _ = init_tracing();
        assert!(init_tracing().is_err());
    }
}
