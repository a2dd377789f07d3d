use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::model::DEFAULT_CITY;

pub const API_KEY_ENV: &str = "WEATHER_API_KEY";
pub const BASE_URL_ENV: &str = "WEATHER_API_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "London"
/// default_days = 3
/// max_range_days = 14   # 0 = no limit
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WeatherAPI.com key. Opaque to the core; only checked for presence.
    pub api_key: Option<String>,

    pub base_url: String,

    /// City used when a request names none.
    pub default_city: String,

    /// Day count used for forecasts when neither a range nor a count is given. Must be >= 1.
    pub default_days: u32,

    /// Longest historical range (inclusive days) accepted; `0` disables the check.
    pub max_range_days: u32,

    /// Expand the current reading into several synthetic sensors. Demo only.
    pub simulate_sensors: bool,

    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_city: DEFAULT_CITY.to_string(),
            default_days: 3,
            max_range_days: 14,
            simulate_sensors: false,
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Read the platform config file; defaults on first run.
    pub fn load() -> Result<Self> {
        Self::read_from(&Self::config_file_path()?)
    }

    /// Write the platform config file.
    pub fn save(&self) -> Result<()> {
        self.write_to(&Self::config_file_path()?)
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)
                .with_context(|| format!("Invalid config file {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Cannot read {}", path.display())),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let dir = path.parent().filter(|d| !d.as_os_str().is_empty());
        if let Some(dir) = dir {
            fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
        }

        let text = toml::to_string_pretty(self).context("Cannot encode configuration as TOML")?;
        fs::write(path, text).with_context(|| format!("Cannot write {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_days == 0 {
            return Err(anyhow!("default_days must be at least 1"));
        }
        Ok(())
    }

    /// The historical span limit handed to the planner, `None` when disabled.
    pub fn range_limit(&self) -> Option<u32> {
        (self.max_range_days > 0).then_some(self.max_range_days)
    }

    pub fn config_file_path() -> Result<PathBuf> {
        ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or_else(|| anyhow!("No platform config directory available"))
    }

    /// Environment values take precedence over whatever was read from disk.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Returns the API key, failing when it is absent or blank.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(anyhow!(
                "No API key configured.\n\
                 Hint: set {API_KEY_ENV} or run `weather-dashboard configure` first."
            )),
        }
    }
}
