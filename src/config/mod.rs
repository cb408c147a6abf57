mod environment;
mod loader;

pub use environment::{resolve_environment, EnvironmentConfig, DEFAULT_BASE_URL, DEFAULT_ENV};
pub use loader::{
    load_settings, DefaultSettings, EnvSettings, LoadedSettings, Settings, DEFAULT_SETTINGS_PATH,
};
