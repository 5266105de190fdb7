//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    load_config, load_or_default, resolve_user_address, ApiSection, Config, ConfigError, LoggingSection,
    SessionSection, DEFAULT_CONFIG_PATH,
};
