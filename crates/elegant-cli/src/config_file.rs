//! Persistent CLI configuration.

use std::path::{Path, PathBuf};

use elegant_core::config::{RemoteConfig, RemoteSettings};

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "cli-config.json";
const CONFIG_PATH_ENV: &str = "ELEGANT_CONFIG_PATH";
const DATA_DIR_ENV: &str = "ELEGANT_DATA_DIR";

pub fn default_config_path() -> Result<PathBuf, CliError> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("elegant").join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI config directory".to_string()))
}

/// `--data-dir`, then `ELEGANT_DATA_DIR`, then the platform data directory
pub fn resolve_data_dir(cli_data_dir: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_data_dir.or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
    {
        return Ok(path);
    }
    dirs::data_dir()
        .map(|dir| dir.join("elegant"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub fn load_settings_from_path(path: &Path) -> Result<RemoteSettings, CliError> {
    if !path.exists() {
        return Ok(RemoteSettings::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|error| {
        CliError::Config(format!(
            "Failed to read config at {}: {}",
            path.display(),
            error
        ))
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        CliError::Config(format!(
            "Failed to parse config at {}: {}",
            path.display(),
            error
        ))
    })
}

pub fn save_settings_to_path(settings: &RemoteSettings, path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|error| {
            CliError::Config(format!(
                "Failed to create config directory {}: {}",
                parent.display(),
                error
            ))
        })?;
    }

    let serialized = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, serialized).map_err(|error| {
        CliError::Config(format!(
            "Failed to write config at {}: {}",
            path.display(),
            error
        ))
    })
}

/// Config file values overridden by `ELEGANT_*` environment variables.
///
/// `Ok(None)` means local-only mode.
pub fn load_remote_config() -> Result<Option<RemoteConfig>, CliError> {
    let file = load_settings_from_path(&default_config_path()?)?;
    resolve_remote_config(file, RemoteSettings::from_env())
}

pub fn resolve_remote_config(
    file: RemoteSettings,
    env: RemoteSettings,
) -> Result<Option<RemoteConfig>, CliError> {
    file.overridden_by(env)
        .resolve()
        .map_err(|error| CliError::Config(error.to_string()))
}

/// Remote config, or an error telling the user how to set it up
pub fn require_remote_config() -> Result<RemoteConfig, CliError> {
    load_remote_config()?.ok_or(CliError::RemoteNotConfigured)
}
