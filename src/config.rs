use serde::Deserialize;
use std::path::PathBuf;
use crate::error::{Result, StoreError};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Account store configuration.
    pub store: StoreConfig,
    /// HTTP transport configuration (optional).
    #[serde(default)]
    pub api: ApiConfig,
}

/// HTTP transport configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Whether `serve` exposes the channels over HTTP.
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    /// Port to listen on (loopback only).
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { enabled: default_api_enabled(), port: default_api_port() }
    }
}

fn default_api_enabled() -> bool { true }
fn default_api_port() -> u16 { 9350 }

/// Which [`KeyringStore`](crate::store::KeyringStore) implementation backs the handler.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Memory,
}

/// Storage parameters for the account store.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Directory holding one JSON file per account key.
    pub base_path: PathBuf,
    #[serde(default)]
    pub backend: Backend,
    /// Bounded channel capacity for the store writer queue.
    #[serde(default = "default_writer_queue")]
    pub writer_queue_size: usize,
}

fn default_writer_queue() -> usize { 64 }

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("Cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| StoreError::Config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.store.backend == Backend::File && self.store.base_path.as_os_str().is_empty() {
            return Err(StoreError::Config("base_path must not be empty".into()));
        }
        if self.store.writer_queue_size == 0 {
            return Err(StoreError::Config("writer_queue_size must be > 0".into()));
        }
        if self.api.enabled && self.api.port == 0 {
            return Err(StoreError::Config("api.port must be > 0".into()));
        }
        Ok(())
    }
}
