//! Configuration management for the demo tooling.

use crate::{CeremonyMedium, CoreError, CoreResult, Paths, TargetNetwork, VerificationMedium};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default bound on the browser-mediated completion wait.
pub const DEFAULT_WEB_COMPLETION_TIMEOUT_SECS: u64 = 120;

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Email or phone verification.
    #[serde(default)]
    pub verification_medium: VerificationMedium,
    /// Native or browser-delegated passkey ceremony.
    #[serde(default)]
    pub ceremony_medium: CeremonyMedium,
    /// Wallet selection rule.
    #[serde(default)]
    pub target_network: TargetNetwork,
    /// Seconds to wait for a hosted ceremony before giving up.
    #[serde(default = "default_web_completion_timeout_secs")]
    pub web_completion_timeout_secs: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_web_completion_timeout_secs() -> u64 {
    DEFAULT_WEB_COMPLETION_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            verification_medium: VerificationMedium::default(),
            ceremony_medium: CeremonyMedium::default(),
            target_network: TargetNetwork::default(),
            web_completion_timeout_secs: DEFAULT_WEB_COMPLETION_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from the config file if present, then apply
    /// `WALLET_DEMO_*` environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Bound on the browser-mediated completion wait.
    pub fn web_completion_timeout(&self) -> Duration {
        Duration::from_secs(self.web_completion_timeout_secs)
    }

    /// Reject values that would make the controller unusable.
    pub fn validate(&self) -> CoreResult<()> {
        if self.web_completion_timeout_secs == 0 {
            return Err(CoreError::Config(
                "web_completion_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(level) = lookup("WALLET_DEMO_LOG_LEVEL") {
            self.log_level = level.trim().to_string();
        }
        if let Some(medium) = lookup("WALLET_DEMO_MEDIUM") {
            self.verification_medium = medium.parse()?;
        }
        if let Some(ceremony) = lookup("WALLET_DEMO_CEREMONY") {
            self.ceremony_medium = ceremony.parse()?;
        }
        if let Some(network) = lookup("WALLET_DEMO_NETWORK") {
            self.target_network = network.parse()?;
        }
        if let Some(timeout) = lookup("WALLET_DEMO_WEB_TIMEOUT_SECS") {
            self.web_completion_timeout_secs = timeout.trim().parse().map_err(|_| {
                CoreError::Config(format!("Invalid WALLET_DEMO_WEB_TIMEOUT_SECS: {}", timeout))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.verification_medium, VerificationMedium::Email);
        assert_eq!(config.ceremony_medium, CeremonyMedium::Native);
        assert_eq!(config.target_network, TargetNetwork::Default);
        assert_eq!(
            config.web_completion_timeout(),
            Duration::from_secs(DEFAULT_WEB_COMPLETION_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_config_load_from_file_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        std::fs::write(
            &config_path,
            r#"{ "log_level": "debug", "ceremony_medium": "browser" }"#,
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.ceremony_medium, CeremonyMedium::Browser);
        assert_eq!(config.verification_medium, VerificationMedium::Email);
        assert_eq!(
            config.web_completion_timeout_secs,
            DEFAULT_WEB_COMPLETION_TIMEOUT_SECS
        );
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            log_level: "trace".to_string(),
            verification_medium: VerificationMedium::Phone,
            target_network: TargetNetwork::Solana,
            ..Config::default()
        };
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("missing"));

        let mut config = Config::default();
        config.apply_overrides(env(&[])).unwrap();
        assert!(!paths.config_file().exists());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("WALLET_DEMO_LOG_LEVEL", "warn"),
                ("WALLET_DEMO_MEDIUM", "phone"),
                ("WALLET_DEMO_CEREMONY", "browser"),
                ("WALLET_DEMO_NETWORK", "solana"),
                ("WALLET_DEMO_WEB_TIMEOUT_SECS", "30"),
            ]))
            .unwrap();

        assert_eq!(config.log_level, "warn");
        assert_eq!(config.verification_medium, VerificationMedium::Phone);
        assert_eq!(config.ceremony_medium, CeremonyMedium::Browser);
        assert_eq!(config.target_network, TargetNetwork::Solana);
        assert_eq!(config.web_completion_timeout_secs, 30);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("WALLET_DEMO_LOG_LEVEL", "   ")]))
            .unwrap();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_invalid_env_override_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_overrides(env(&[("WALLET_DEMO_WEB_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_fails_validation() {
        let config = Config {
            web_completion_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file_is_json_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        let result = Config::load_from_file(&config_path);
        assert!(matches!(result, Err(CoreError::Json(_))));
    }
}
