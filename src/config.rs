// Dashboard configuration
// JSON file under the user's config dir, with environment overrides.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::{info, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::models::TimeWindow;

pub const ENV_API_URL: &str = "DASHBOARD_API_URL";
pub const ENV_TOKEN: &str = "DASHBOARD_TOKEN";

const CONFIG_DIR_NAME: &str = "supplier-dashboard";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Base64-encoded bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub request_timeout_secs: u64,
    pub default_window: String,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub reconcile_on_mark_read_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: "http://localhost:8000/api".to_string(),
            token: None,
            request_timeout_secs: 15,
            default_window: TimeWindow::default().token().to_string(),
            log_file: None,
            log_level: "info".to_string(),
            reconcile_on_mark_read_failure: false,
        }
    }
}

impl Config {
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(BASE64.encode(token));
    }

    /// Decoded token. Values that are not valid base64 are used as-is.
    pub fn get_token(&self) -> Option<String> {
        self.token.as_ref().map(|encoded| {
            BASE64
                .decode(encoded)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .unwrap_or_else(|| encoded.clone())
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn window(&self) -> Result<TimeWindow, ConfigError> {
        TimeWindow::parse(&self.default_window).ok_or_else(|| ConfigError::InvalidValue {
            field: "default_window",
            value: self.default_window.clone(),
        })
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            warn!("Unknown log level '{}', using info", self.log_level);
            log::LevelFilter::Info
        })
    }

    /// Apply environment overrides from the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.set_token(&token);
        }
    }
}

static CONFIG_PATH_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

/// Use `path` instead of the default config location. Only the first call
/// has an effect.
pub fn set_config_path_override(path: PathBuf) {
    if CONFIG_PATH_OVERRIDE.set(path).is_err() {
        warn!("Config path override already set, ignoring");
    }
}

pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    Ok(dirs::config_dir().ok_or(ConfigError::NoConfigDir)?.join(CONFIG_DIR_NAME))
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = CONFIG_PATH_OVERRIDE.get() {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Read a config file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let display = path.display().to_string();
    if !path.exists() {
        info!("No config at {}, using defaults", display);
        return Ok(Config::default());
    }

    let file = File::open(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    let config: Config = serde_json::from_reader(file).map_err(|source| ConfigError::Parse {
        path: display.clone(),
        source,
    })?;
    info!("Loaded config from {}", display);
    Ok(config)
}

/// Load from the configured location and apply environment overrides.
pub fn load_config() -> Result<Config, ConfigError> {
    let mut config = load_config_from(&get_config_path()?)?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let display = path.display().to_string();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }
    let file = File::create(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::to_writer_pretty(file, config).map_err(|source| ConfigError::Parse {
        path: display.clone(),
        source,
    })?;
    info!("Config saved to {}", display);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_token_round_trips_through_base64() {
        let mut config = Config::default();
        config.set_token("secret-token");
        assert_ne!(config.token.as_deref(), Some("secret-token"));
        assert_eq!(config.get_token().as_deref(), Some("secret-token"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(ENV_API_URL, "https://api.test"), (ENV_TOKEN, "t0k")].into();
        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_base_url, "https://api.test");
        assert_eq!(config.get_token().as_deref(), Some("t0k"));
    }

    #[test]
    fn test_bad_window_is_reported() {
        let config = Config {
            default_window: "1year".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.window(), Err(ConfigError::InvalidValue { field: "default_window", .. })));
    }
}
