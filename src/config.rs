//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\bookfetch\config.toml
//! - macOS: ~/Library/Application Support/bookfetch/config.toml
//! - Linux: ~/.config/bookfetch/config.toml
//!
//! The config file is human-readable and editable. Settings are loaded
//! at startup; a missing or broken file falls back to defaults so the
//! tool always starts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::enrichment::service::EnrichmentConfig;
use crate::enrichment::transport::TransportConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenLibrary connection settings
    pub openlibrary: OpenLibrarySettings,

    /// Enrichment pipeline settings
    pub enrichment: EnrichmentSettings,
}

/// OpenLibrary connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenLibrarySettings {
    /// Base URL of the OpenLibrary API
    pub base_url: String,

    /// Sliding-window request budget per minute
    pub rate_limit_per_minute: usize,

    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Concurrent in-flight requests to OpenLibrary
    pub max_concurrent_requests: usize,
}

impl Default for OpenLibrarySettings {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            base_url: transport.base_url,
            rate_limit_per_minute: transport.rate_limit_per_minute,
            timeout_secs: transport.timeout.as_secs(),
            max_retries: transport.max_retries,
            max_concurrent_requests: transport.max_concurrent_requests,
        }
    }
}

impl OpenLibrarySettings {
    /// Build the transport config these settings describe
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            base_url: self.base_url.clone(),
            rate_limit_per_minute: self.rate_limit_per_minute,
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }
}

/// Enrichment pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    /// Hard deadline per enrichment in seconds
    pub timeout_secs: u64,

    /// Concurrent enrichments before requests queue
    pub max_concurrent: usize,

    /// Minimum acceptable quality score (0.0 - 1.0)
    pub min_quality_score: f64,

    /// Cache lifetime for fetched records in seconds
    pub cache_ttl_secs: u64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        let service = EnrichmentConfig::default();
        Self {
            timeout_secs: service.timeout.as_secs(),
            max_concurrent: service.max_concurrent,
            min_quality_score: service.min_quality_score,
            cache_ttl_secs: service.cache_ttl.as_secs(),
        }
    }
}

impl EnrichmentSettings {
    /// Build the service config these settings describe
    pub fn service_config(&self) -> EnrichmentConfig {
        EnrichmentConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            max_concurrent: self.max_concurrent,
            min_quality_score: self.min_quality_score,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bookfetch"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            tracing::error!("Failed to load config file {:?}: {}", path, e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit path.
///
/// Unlike `load`, a missing or malformed file is an error here; someone
/// pointing at a specific file wants to know when it's wrong.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
}

// ============================================================================
// Tests
// ============================================================================
