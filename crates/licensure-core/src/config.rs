//! Configuration management for Licensure.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Cap on records returned per query; bounds detail-page crawling.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Main application configuration.
///
/// This is loaded from `~/.config/licensure/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP session settings
    pub session: SessionConfig,
    /// CAPTCHA solving service settings
    pub captcha: CaptchaConfig,
    /// Jurisdiction endpoints
    pub endpoints: EndpointConfig,
    /// Lookup behavior
    pub lookup: LookupConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `CAPSOLVER_API_KEY`: CAPTCHA solving service key
    /// - `LICENSURE_HTTP_TIMEOUT_SECS`: Override per-request HTTP timeout
    /// - `LICENSURE_CAPTCHA_TIMEOUT_SECS`: Override CAPTCHA solve deadline
    /// - `LICENSURE_MAX_RESULTS`: Override the per-query record cap
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup function.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("CAPSOLVER_API_KEY") {
            if !key.trim().is_empty() {
                self.captcha.api_key = Some(key.trim().to_string());
                tracing::debug!("CAPTCHA API key set from env");
            }
        }

        if let Some(secs) = var("LICENSURE_HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.session.timeout_secs = secs;
            tracing::debug!("Override session.timeout_secs from env: {}", secs);
        }

        if let Some(secs) = var("LICENSURE_CAPTCHA_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.captcha.timeout_secs = secs;
            tracing::debug!("Override captcha.timeout_secs from env: {}", secs);
        }

        if let Some(max) = var("LICENSURE_MAX_RESULTS").and_then(|v| v.parse().ok()) {
            self.lookup.max_results = max;
            tracing::debug!("Override lookup.max_results from env: {}", max);
        }
    }

    /// Check values that would make lookups misbehave.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.captcha.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "captcha.poll_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.captcha.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "captcha.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.lookup.max_results == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lookup.max_results".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist. The CAPTCHA API key
    /// is never written.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/licensure/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "licensure", "licensure").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// HTTP session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
    /// Browser user agent presented to jurisdiction sites
    pub user_agent: String,
    /// Accept-Language header value
    pub accept_language: String,
}

impl SessionConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 90,
            max_redirects: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

/// CAPTCHA solving service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Solving service API key (read from the environment, never stored)
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Solving service base URL
    pub endpoint: String,
    /// Task type requested from the service
    pub task_type: String,
    /// Delay between result polls in milliseconds
    pub poll_interval_ms: u64,
    /// Deadline for a solve, measured from task creation
    pub timeout_secs: u64,
}

impl CaptchaConfig {
    /// Poll interval as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Solve deadline as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.capsolver.com".to_string(),
            task_type: "AntiTurnstileTaskProxyLess".to_string(),
            poll_interval_ms: 3000,
            timeout_secs: 60,
        }
    }
}

/// Jurisdiction endpoints. Overridable so flows can be pointed at mirrors
/// or local fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// NAIC licensee search API
    pub naic_api_url: String,
    /// NAIC public lookup portal (manual fallback)
    pub naic_portal_url: String,
    /// Florida licensee search site
    pub florida_base_url: String,
    /// California licensee search site
    pub california_base_url: String,
    /// Texas licensee search page
    pub texas_search_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            naic_api_url: "https://services.naic.org/api/licenseLookup/search".to_string(),
            naic_portal_url: "https://sbs.naic.org/solar/external/pages/#/search/licensee/search"
                .to_string(),
            florida_base_url: "https://licenseesearch.fldfs.com".to_string(),
            california_base_url: "https://cdicloud.insurance.ca.gov/cal".to_string(),
            texas_search_url: "https://txapps.texas.gov/NASApp/tdi/TdiARManager".to_string(),
        }
    }
}

/// Lookup behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Maximum records returned per query
    pub max_results: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}
