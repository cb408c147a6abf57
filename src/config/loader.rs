use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.json";

fn default_timeout() -> f64 {
    10.0
}

fn default_retries() -> u32 {
    2
}

fn default_backoff() -> f64 {
    0.2
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultSettings {
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_backoff")]
    pub retry_backoff: f64,
    #[serde(default)]
    pub default_env: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retries: default_retries(),
            retry_backoff: default_backoff(),
            default_env: None,
            headers: BTreeMap::new(),
        }
    }
}

/// Per-environment entry; anything left out falls back to `default`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EnvSettings {
    pub base_url: Option<String>,
    pub timeout: Option<f64>,
    pub retries: Option<u32>,
    pub retry_backoff: Option<f64>,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub default: DefaultSettings,
    pub envs: BTreeMap<String, EnvSettings>,
}

#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub path: PathBuf,
}

pub fn load_settings(path: &Path) -> Result<LoadedSettings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let settings: Settings =
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if settings.envs.is_empty() {
        return Err(ConfigError::NoEnvironments {
            path: path.to_path_buf(),
        });
    }

    debug!(
        path = %path.display(),
        envs = settings.envs.len(),
        "loaded settings"
    );

    Ok(LoadedSettings {
        settings,
        path: path.to_path_buf(),
    })
}
