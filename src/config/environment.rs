use std::time::Duration;

use tracing::info;
use url::Url;

use crate::error::ConfigError;

use super::loader::{EnvSettings, Settings};

pub const DEFAULT_ENV: &str = "dev";
pub const DEFAULT_BASE_URL: &str = "https://automationexercise.com/api";

/// The one active environment for a run. Built once and handed to the client
/// by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    pub name: String,
    pub base_url: String,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_backoff: Duration,
    pub headers: Vec<(String, String)>,
}

pub fn resolve_environment(
    settings: &Settings,
    requested: Option<&str>,
) -> Result<EnvironmentConfig, ConfigError> {
    let name = requested
        .or(settings.default.default_env.as_deref())
        .unwrap_or(DEFAULT_ENV)
        .trim()
        .to_lowercase();

    let Some(env) = settings.envs.get(&name) else {
        return Err(ConfigError::UnknownEnvironment {
            requested: name,
            valid: settings.envs.keys().cloned().collect(),
        });
    };

    let config = build_environment(&name, env, settings)?;
    info!("[ENV={}] Using base URL: {}", config.name, config.base_url);
    Ok(config)
}

fn build_environment(
    name: &str,
    env: &EnvSettings,
    settings: &Settings,
) -> Result<EnvironmentConfig, ConfigError> {
    let defaults = &settings.default;

    let raw_url = env.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL).trim();
    Url::parse(raw_url).map_err(|source| ConfigError::InvalidBaseUrl {
        env: name.to_string(),
        url: raw_url.to_string(),
        source,
    })?;
    let base_url = raw_url.trim_end_matches('/').to_string();

    let timeout_secs = env.timeout.unwrap_or(defaults.timeout);
    if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
        return Err(ConfigError::InvalidValue {
            env: name.to_string(),
            field: "timeout",
            reason: format!("expected a positive number of seconds, got {timeout_secs}"),
        });
    }

    let backoff_secs = env.retry_backoff.unwrap_or(defaults.retry_backoff);
    if !backoff_secs.is_finite() || backoff_secs < 0.0 {
        return Err(ConfigError::InvalidValue {
            env: name.to_string(),
            field: "retry_backoff",
            reason: format!("expected a non-negative number of seconds, got {backoff_secs}"),
        });
    }

    let mut headers: Vec<(String, String)> = defaults
        .headers
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (key, value) in &env.headers {
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(key));
        headers.push((key.clone(), value.clone()));
    }

    Ok(EnvironmentConfig {
        name: name.to_string(),
        base_url,
        timeout: seconds(name, "timeout", timeout_secs)?,
        retries: env.retries.unwrap_or(defaults.retries),
        retry_backoff: seconds(name, "retry_backoff", backoff_secs)?,
        headers,
    })
}

fn seconds(env: &str, field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|err| ConfigError::InvalidValue {
        env: env.to_string(),
        field,
        reason: format!("{value} seconds is out of range: {err}"),
    })
}
