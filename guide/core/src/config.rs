//! TOML Configuration File Support
//!
//! Centralized configuration loading for the Guide, supporting a TOML file
//! at `~/.config/reminder/guide.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. Environment variables (`REMINDER_*`)
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! base_url = "http://127.0.0.1:5000"
//! page = "home"
//! thinking_delay_ms = 3000
//! speech_locale = "en-US"
//! request_timeout_secs = 120
//! status_expiry_ms = 1500
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Guide configuration
#[derive(Clone, Debug)]
pub struct GuideConfig {
    /// Journal backend base URL
    pub base_url: String,
    /// Page identifier sent with fresh chat turns
    pub page: String,
    /// Artificial "thinking" delay before a reply is shown, in
    /// milliseconds. 0 disables the delay.
    pub thinking_delay_ms: u64,
    /// Speech recognition locale, handed to the recognizer each time a
    /// capture session starts
    pub speech_locale: String,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// How long transient status messages stay visible, in milliseconds
    pub status_expiry_ms: u64,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            page: "home".to_string(),
            thinking_delay_ms: 3000,
            speech_locale: "en-US".to_string(),
            request_timeout_secs: 120,
            status_expiry_ms: 1500,
        }
    }
}

/// TOML file shape; every field optional
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideToml {
    /// Journal backend base URL
    pub base_url: Option<String>,
    /// Page identifier for fresh chat turns
    pub page: Option<String>,
    /// Thinking delay in milliseconds
    pub thinking_delay_ms: Option<u64>,
    /// Speech recognition locale
    pub speech_locale: Option<String>,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Status message lifetime in milliseconds
    pub status_expiry_ms: Option<u64>,
}

impl GuideConfig {
    /// Apply TOML values on top of this configuration
    fn apply_toml(&mut self, file: GuideToml) {
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(page) = file.page {
            self.page = page;
        }
        if let Some(delay) = file.thinking_delay_ms {
            self.thinking_delay_ms = delay;
        }
        if let Some(locale) = file.speech_locale {
            self.speech_locale = locale;
        }
        if let Some(timeout) = file.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(expiry) = file.status_expiry_ms {
            self.status_expiry_ms = expiry;
        }
    }

    /// Apply environment variable overrides
    fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides through an environment lookup
    ///
    /// The lookup is injected so precedence is testable without touching
    /// process-wide environment state. Unparseable numeric values are
    /// ignored, keeping the file or default value.
    fn apply_env_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = var("REMINDER_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(page) = var("REMINDER_PAGE") {
            self.page = page;
        }
        if let Some(delay) = var("REMINDER_THINKING_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.thinking_delay_ms = delay;
        }
        if let Some(locale) = var("REMINDER_SPEECH_LOCALE") {
            self.speech_locale = locale;
        }
        if let Some(timeout) = var("REMINDER_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout_secs = timeout;
        }
        if let Some(expiry) = var("REMINDER_STATUS_EXPIRY_MS").and_then(|v| v.parse().ok()) {
            self.status_expiry_ms = expiry;
        }
    }
}

/// Default configuration file path
///
/// `$XDG_CONFIG_HOME/reminder/guide.toml`, typically
/// `~/.config/reminder/guide.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reminder").join("guide.toml"))
}

/// Load configuration from the default path plus environment overrides
///
/// A missing file is not an error; defaults are used.
pub fn load_config() -> Result<GuideConfig, ConfigError> {
    load_config_from_path(default_config_path().as_deref())
}

/// Load configuration from a specific path plus environment overrides
pub fn load_config_from_path(path: Option<&Path>) -> Result<GuideConfig, ConfigError> {
    let mut config = GuideConfig::default();

    if let Some(path) = path {
        if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let file: GuideToml = toml::from_str(&contents)?;
            config.apply_toml(file);
            tracing::debug!(path = %path.display(), "loaded guide config file");
        }
    }

    config.apply_env();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = GuideConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.thinking_delay_ms, 3000);
        assert_eq!(config.speech_locale, "en-US");
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let mut config = GuideConfig::default();
        let file: GuideToml = toml::from_str(
            r#"
            base_url = "http://journal.example:8080"
            thinking_delay_ms = 0
            "#,
        )
        .unwrap();
        config.apply_toml(file);

        assert_eq!(config.base_url, "http://journal.example:8080");
        assert_eq!(config.thinking_delay_ms, 0);
        // Untouched fields keep defaults
        assert_eq!(config.page, "home");
    }

    #[test]
    fn test_env_overrides_toml() {
        let mut config = GuideConfig::default();
        let file: GuideToml = toml::from_str(
            r#"
            base_url = "http://from-file:1"
            status_expiry_ms = 900
            page = "analyzer"
            "#,
        )
        .unwrap();
        config.apply_toml(file);

        config.apply_env_from(|key| match key {
            "REMINDER_BASE_URL" => Some("http://from-env:2".to_string()),
            "REMINDER_STATUS_EXPIRY_MS" => Some("2500".to_string()),
            _ => None,
        });

        assert_eq!(config.base_url, "http://from-env:2");
        assert_eq!(config.status_expiry_ms, 2500);
        // Unset env keys keep the file values
        assert_eq!(config.page, "analyzer");
    }

    #[test]
    fn test_unparseable_env_number_is_ignored() {
        let mut config = GuideConfig::default();
        config.apply_env_from(|key| {
            (key == "REMINDER_THINKING_DELAY_MS").then(|| "soon".to_string())
        });
        assert_eq!(config.thinking_delay_ms, 3000);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.toml");
        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
    }

    #[test]
    fn test_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.toml");
        std::fs::write(&path, "page = \"analyzer\"\n").unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.page, "analyzer");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.toml");
        std::fs::write(&path, "base_url = [not toml").unwrap();

        let result = load_config_from_path(Some(&path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
