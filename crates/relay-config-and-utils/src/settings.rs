//! Persistent settings (`config.json`) with environment overrides.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVEL_ENV: &str = "OMF_RELAY_LOG_LEVEL";
const PRODUCER_TOKEN_ENV: &str = "OMF_PRODUCER_TOKEN";

/// Relay publisher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Token sent as the `producertoken` header.
    pub producer_token: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            producer_token: String::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Load `config.json` if present, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut settings = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };
        settings.load_from_env();

        Ok(settings)
    }

    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(
            std::env::var(LOG_LEVEL_ENV).ok(),
            std::env::var(PRODUCER_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, log_level: Option<String>, producer_token: Option<String>) {
        if let Some(level) = log_level.filter(|v| !v.trim().is_empty()) {
            self.log_level = level.trim().to_string();
        }
        if let Some(token) = producer_token.filter(|v| !v.trim().is_empty()) {
            self.producer_token = token.trim().to_string();
        }
    }

    /// Fails when no producer token was configured anywhere.
    pub fn require_producer_token(&self) -> CoreResult<&str> {
        if self.producer_token.trim().is_empty() {
            return Err(CoreError::Config(format!(
                "no producer token; pass --producer-token, set {} or add it to config.json",
                PRODUCER_TOKEN_ENV
            )));
        }
        Ok(&self.producer_token)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.log_level, DEFAULT_LOG_LEVEL);
        assert!(settings.producer_token.is_empty());
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "log_level": "debug" }"#).unwrap();

        let settings = Settings::load_from_file(&path).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn test_save_and_load_from_file() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("relay"));

        let settings = Settings {
            producer_token: "uid=abc".to_string(),
            request_timeout_secs: 5,
            ..Settings::default()
        };
        settings.save(&paths).unwrap();

        let loaded = Settings::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Settings::load_from_file(&path),
            Err(CoreError::Json(_))
        ));
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let mut settings = Settings {
            producer_token: "from-file".to_string(),
            ..Settings::default()
        };

        settings.apply_overrides(Some("  ".to_string()), Some(String::new()));
        assert_eq!(settings.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(settings.producer_token, "from-file");

        settings.apply_overrides(Some("warn".to_string()), Some("from-env".to_string()));
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.producer_token, "from-env");
    }

    #[test]
    fn test_missing_token_is_a_config_error() {
        let settings = Settings::default();
        assert!(matches!(
            settings.require_producer_token(),
            Err(CoreError::Config(_))
        ));
    }
}
