use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use hyauth_core::config::Settings;

/// Per-user config directory, also home of the stored session
pub fn config_directory() -> PathBuf {
    ProjectDirs::from("com", "hyauth", "hyauth")
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("config"))
}

pub fn get_configuration_with_paths(
    current_dir_path: Option<PathBuf>,
    system_config_dir_path: Option<PathBuf>,
) -> Result<Settings, config::ConfigError> {
    let local_config_dir = current_dir_path.unwrap_or_else(|| {
        std::env::current_dir()
            .map(|p| p.join("config"))
            .unwrap_or_else(|_| PathBuf::from("config"))
    });
    let system_config_dir = system_config_dir_path.unwrap_or_else(config_directory);

    let defaults = Settings::default();

    let settings = Config::builder()
        .set_default("endpoints.auth_url", defaults.endpoints.auth_url)?
        .set_default("endpoints.account_url", defaults.endpoints.account_url)?
        .set_default("endpoints.session_url", defaults.endpoints.session_url)?
        .set_default("oauth.client_id", defaults.oauth.client_id)?
        .set_default("oauth.scope", defaults.oauth.scope)?
        .set_default("http.timeout_secs", defaults.http.timeout_secs as i64)?
        .set_default(
            "http.connect_timeout_secs",
            defaults.http.connect_timeout_secs as i64,
        )?
        .set_default("http.user_agent", defaults.http.user_agent)?
        .set_default("log_level", defaults.log_level)?
        .add_source(File::from(system_config_dir.join("config.toml")).required(false))
        .add_source(File::from(local_config_dir.join("config.toml")).required(false))
        .add_source(Environment::with_prefix("HYAUTH").separator("__"))
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    get_configuration_with_paths(None, None)
}
