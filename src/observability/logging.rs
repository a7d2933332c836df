//! # Logging
//!
//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this crate and
//! `warn` to everything else, which keeps `kube`/`hyper` request noise out of the output.

use crate::config::LogFormat;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(log_level: &str) -> String {
    let level = match log_level.trim().to_lowercase().as_str() {
        level @ ("error" | "warn" | "info" | "debug" | "trace") => level.to_string(),
        "warning" => "warn".to_string(),
        _ => "info".to_string(),
    };
    format!("warn,sshfs_keysync={level}")
}

/// Install the global subscriber, writing to stderr so stdout stays free for command output
pub fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow!("Failed to initialize tracing subscriber: {e}"))
}
