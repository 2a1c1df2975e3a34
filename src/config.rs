//! TOML configuration.
//!
//! ```toml
//! [backend]
//! url = "http://127.0.0.1:8000"
//! timeout_secs = 30
//! folder_timeout_secs = 300
//!
//! [query]
//! top_k = 5
//! ```
//!
//! Every section and key is optional. `RAGC_BACKEND_URL` overrides
//! `backend.url` after the file is read.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `backend.url`.
pub const BACKEND_URL_ENV: &str = "RAGC_BACKEND_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Timeout for collections, query, and single-document ingestion.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Timeout for zipped-folder ingestion, which can run for minutes.
    #[serde(default = "default_folder_timeout_secs")]
    pub folder_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            folder_timeout_secs: default_folder_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn folder_timeout(&self) -> Duration {
        Duration::from_secs(self.folder_timeout_secs)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

fn default_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_folder_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> u32 {
    5
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// Read, override from the environment, and validate a config file.
///
/// A missing file is not an error: the defaults apply.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::minimal()
    };

    if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
        if !url.trim().is_empty() {
            config.backend.url = url.trim().to_string();
        }
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let url = &config.backend.url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!("backend.url must start with http:// or https:// (got '{}')", url);
    }
    if config.backend.timeout_secs == 0 {
        anyhow::bail!("backend.timeout_secs must be > 0");
    }
    if config.backend.folder_timeout_secs == 0 {
        anyhow::bail!("backend.folder_timeout_secs must be > 0");
    }
    if config.query.top_k < 1 {
        anyhow::bail!("query.top_k must be >= 1");
    }
    Ok(())
}
