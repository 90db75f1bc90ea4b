use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    alert::DEFAULT_ALERT_PROBABILITY,
    fetch::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_RETRIES, RetryPolicy},
    model::{City, default_featured_cities},
    normalize::DEFAULT_FORECAST_DAYS,
    provider::open_meteo::{FORECAST_URL, GEOCODING_URL},
};

/// Overrides `[upstream] api_key` when set and non-empty.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.weatherapi.com/v1";
pub const DEFAULT_NOTIFICATION_SECS: u64 = 3;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [server]
/// bind = "0.0.0.0:8080"
///
/// [upstream]
/// api_key = "..."
///
/// [retry]
/// max_retries = 5
/// max_delay_ms = 8000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub retry: RetryConfig,
    pub dashboard: DashboardConfig,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Credentials for the provider the backend proxies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Absent means uncapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: None,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            self.max_delay_ms.map(Duration::from_millis),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub forecast_days: usize,
    pub alert_probability: f64,
    pub notification_secs: u64,
    pub featured_cities: Vec<City>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            forecast_days: DEFAULT_FORECAST_DAYS,
            alert_probability: DEFAULT_ALERT_PROBABILITY,
            notification_secs: DEFAULT_NOTIFICATION_SECS,
            featured_cities: default_featured_cities(),
        }
    }
}

impl DashboardConfig {
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }
}

/// Endpoints of the keyless forecast and geocoding provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub forecast_url: String,
    pub geocoding_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            forecast_url: FORECAST_URL.to_string(),
            geocoding_url: GEOCODING_URL.to_string(),
        }
    }
}

impl Config {
    /// Load config from the platform config dir, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;

        if cfg.dashboard.featured_cities.is_empty() {
            bail!("[dashboard] featured_cities must list at least one city");
        }

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Store the upstream secret.
    pub fn set_api_key(&mut self, api_key: String) {
        self.upstream.api_key = Some(api_key);
    }

    /// Apply environment overrides on top of the file values.
    pub fn with_env(mut self) -> Self {
        self.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        self
    }

    fn apply_api_key_override(&mut self, value: Option<String>) {
        if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
            self.upstream.api_key = Some(key);
        }
    }

    /// The upstream secret, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        let key = self.upstream.api_key.as_deref()?;
        (!key.trim().is_empty()).then_some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml_str("").unwrap();

        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.server.bind, "127.0.0.1:3000");
        assert_eq!(cfg.retry.policy(), RetryPolicy::default());
        assert_eq!(cfg.dashboard.forecast_days, 7);
        assert_eq!(cfg.dashboard.notification_ttl(), Duration::from_secs(3));
        assert_eq!(cfg.dashboard.featured_cities.len(), 5);
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [upstream]
            api_key = "SECRET"

            [retry]
            max_retries = 5
            max_delay_ms = 8000
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api_key(), Some("SECRET"));
        assert_eq!(cfg.upstream.base_url, DEFAULT_UPSTREAM_URL);

        let policy = cfg.retry.policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Some(Duration::from_secs(8)));
    }

    #[test]
    fn featured_cities_can_be_replaced() {
        let cfg = Config::from_toml_str(
            r#"
            [[dashboard.featured_cities]]
            name = "Reykjavik"
            country = "Iceland"
            latitude = 64.1466
            longitude = -21.9426
            "#,
        )
        .unwrap();

        assert_eq!(cfg.dashboard.featured_cities.len(), 1);
        assert_eq!(cfg.dashboard.featured_cities[0].label(), "Reykjavik, Iceland");
    }

    #[test]
    fn empty_featured_cities_is_rejected() {
        let err = Config::from_toml_str("[dashboard]\nfeatured_cities = []\n").unwrap_err();
        assert!(err.to_string().contains("featured_cities"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn env_override_wins_unless_blank() {
        let mut cfg = Config::default();
        cfg.set_api_key("FROM_FILE".into());

        cfg.apply_api_key_override(Some(String::new()));
        assert_eq!(cfg.api_key(), Some("FROM_FILE"));

        cfg.apply_api_key_override(None);
        assert_eq!(cfg.api_key(), Some("FROM_FILE"));

        cfg.apply_api_key_override(Some("FROM_ENV".into()));
        assert_eq!(cfg.api_key(), Some("FROM_ENV"));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let name = format!("weather-dashboard-cfg-{}", std::process::id());
        let dir = std::env::temp_dir().join(name);
        let path = dir.join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.retry.max_delay_ms = Some(2500);
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir()
            .join("weather-dashboard-does-not-exist")
            .join("config.toml");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
