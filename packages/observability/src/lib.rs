//! # Observability
//!
//! Centralized logging layer for the wallet session workspace.
//!
//! Crates in this workspace are **log producers** only. They use the standard
//! `tracing` macros and never decide where logs go. Binaries call
//! [`init`] or [`init_with_config`] exactly once at startup.
//!
//! ## Dev Mode
//!
//! With the `dev` feature enabled, every event is written as one JSON line to
//! a central file (`~/.wallet-demo/logs/dev.jsonl` unless overridden), so an
//! interactive terminal session is not interleaved with log output:
//!
//! - `tail -f ~/.wallet-demo/logs/dev.jsonl | jq` for pretty JSON
//! - `lnav ~/.wallet-demo/logs/dev.jsonl` for interactive exploration
//!
//! Without the feature, a compact human-readable format goes to stderr.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "wallet-cli".into(),
//!         default_level: "debug".into(),
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

#[cfg(feature = "dev")]
mod dev;
#[cfg(feature = "dev")]
mod json_layer;

use std::path::PathBuf;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "wallet-cli").
    /// Included in every JSON log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by the `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path (dev mode only).
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr in dev mode.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings for `service_name`.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with a custom configuration.
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber installed.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    {
        dev::init_dev_subscriber(&config);
    }

    #[cfg(not(feature = "dev"))]
    {
        use tracing_subscriber::util::SubscriberInitExt;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level)),
            )
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .finish()
            .try_init();
    }
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        let dir = std::env::temp_dir().join("observability-init-twice");
        let config = LogConfig {
            service_name: "test".into(),
            default_level: "debug".into(),
            log_path: Some(dir.join("dev.jsonl")),
            also_stderr: false,
        };
        init_with_config(config.clone());
        init_with_config(config);
    }
}
