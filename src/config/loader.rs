//! Configuration Loader
//!
//! Loads and validates the desk configuration from a TOML file.
//! Every section is optional; missing keys fall back to local-development defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::marketplace::MarketplaceConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/desk.toml";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";
pub const DEFAULT_USER_ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure matching desk.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Marketplace API section
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    /// Backend origin; `/api/...` is appended per request
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiSection {
    /// Get base URL with environment variable override
    /// Checks BOND_API_URL env var first, falls back to config value
    pub fn get_base_url(&self) -> String {
        std::env::var("BOND_API_URL").unwrap_or_else(|_| self.base_url.clone())
    }
}

/// Session section: who is trading and how often to poll
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_user_address")]
    pub user_address: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            user_address: default_user_address(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl SessionSection {
    /// Get user address with environment variable override
    /// Checks BOND_USER_ADDRESS env var first, falls back to config value
    pub fn get_user_address(&self) -> Result<String, ConfigError> {
        resolve_user_address(std::env::var("BOND_USER_ADDRESS").ok(), &self.user_address)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_address() -> String {
    DEFAULT_USER_ADDRESS.to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// `~` and `$VAR` expansion for user-supplied paths
pub fn expand_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let raw = path.as_ref().to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.as_ref().to_path_buf(),
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(expand_path(path))?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let expanded = expand_path(path);
    if !expanded.exists() {
        tracing::debug!("No config at {}, using defaults", expanded.display());
        let config = Config::default();
        config.validate()?;
        return Ok(config);
    }
    load_config(expanded)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.api.base_url)?;

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.session.user_address.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "session.user_address must not be empty".to_string(),
            ));
        }

        if self.session.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "session.poll_interval_secs must be > 0".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }

    /// Marketplace client settings. `api_url` (from the command line) wins
    /// over BOND_API_URL, which wins over the config file.
    pub fn marketplace(&self, api_url: Option<&str>) -> Result<MarketplaceConfig, ConfigError> {
        let base_url = match api_url {
            Some(url) => url.to_string(),
            None => self.api.get_base_url(),
        };
        validate_base_url(&base_url)?;
        Ok(MarketplaceConfig::from(&ApiSection {
            base_url,
            timeout_secs: self.api.timeout_secs,
        }))
    }
}

/// Override first, then the configured value. A blank result is rejected.
pub fn resolve_user_address(
    override_value: Option<String>,
    configured: &str,
) -> Result<String, ConfigError> {
    let address = override_value.unwrap_or_else(|| configured.to_string());
    let address = address.trim();
    if address.is_empty() {
        return Err(ConfigError::ValidationError(
            "user address must not be empty (check BOND_USER_ADDRESS)".to_string(),
        ));
    }
    Ok(address.to_string())
}

fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    let trimmed = url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "api.base_url must be an http(s) URL, got '{}'",
            url
        )));
    }
    Ok(())
}

impl From<&ApiSection> for MarketplaceConfig {
    fn from(api: &ApiSection) -> Self {
        MarketplaceConfig {
            base_url: api.base_url.clone(),
            timeout: Duration::from_secs(api.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[api]
base_url = "https://bonds.example.test"
timeout_secs = 5

[session]
user_address = "0xabc"
poll_interval_secs = 10

[logging]
level = "debug"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.api.base_url, "https://bonds.example.test");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.session.user_address, "0xabc");
        assert_eq!(config.session.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/desk.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_or_default("/nonexistent/path/desk.toml").unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.session.poll_interval_secs, 30);
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_sections_are_optional() {
        let file = write_config("[session]\nuser_address = \"0xdef\"\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.session.user_address, "0xdef");
        assert_eq!(config.session.poll_interval_secs, 30);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_invalid_poll_interval() {
        let file = write_config("[session]\npoll_interval_secs = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let file = write_config("[api]\nbase_url = \"ftp://bonds\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn test_invalid_log_level() {
        let file = write_config("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[api\nbase_url = ");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_api_section_to_marketplace_config() {
        let api = ApiSection {
            base_url: "http://127.0.0.1:9000".to_string(),
            timeout_secs: 3,
        };
        let market = MarketplaceConfig::from(&api);
        assert_eq!(market.base_url, "http://127.0.0.1:9000");
        assert_eq!(market.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_expand_path_leaves_plain_paths() {
        assert_eq!(expand_path("config/desk.toml"), PathBuf::from("config/desk.toml"));
    }

    #[test]
    fn test_command_line_url_is_validated() {
        let config = Config::default();
        let err = config.marketplace(Some("ftp://host")).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("ftp://host"));
    }

    #[test]
    fn test_command_line_url_wins() {
        let config = Config::default();
        let market = config.marketplace(Some("https://bonds.example.test")).unwrap();
        assert_eq!(market.base_url, "https://bonds.example.test");
        assert_eq!(market.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_user_address_override() {
        assert_eq!(resolve_user_address(Some("0xdef".to_string()), "0xabc").unwrap(), "0xdef");
        assert_eq!(resolve_user_address(None, "0xabc").unwrap(), "0xabc");
    }

    #[test]
    fn test_blank_user_address_override_is_rejected() {
        let result = resolve_user_address(Some("   ".to_string()), "0xabc");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        assert!(resolve_user_address(Some(String::new()), "0xabc").is_err());
    }
}
