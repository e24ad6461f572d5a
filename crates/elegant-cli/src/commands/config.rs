use std::path::Path;

use elegant_core::config::RemoteSettings;

use crate::cli::ConfigCommands;
use crate::config_file::{
    default_config_path, load_settings_from_path, resolve_remote_config, save_settings_to_path,
};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands) -> Result<(), CliError> {
    let path = default_config_path()?;
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            share_base_url,
        } => run_config_init(
            &path,
            RemoteSettings {
                supabase_url,
                supabase_anon_key,
                share_base_url,
            },
        ),
        ConfigCommands::Show => run_config_show(&path),
    }
}

/// Merge explicit flags over the existing file and save it.
///
/// The merged settings must resolve, so a URL without a key is rejected
/// before anything is written.
pub fn run_config_init(path: &Path, flags: RemoteSettings) -> Result<(), CliError> {
    let merged = load_settings_from_path(path)?.overridden_by(flags);
    let resolved = resolve_remote_config(merged.clone(), RemoteSettings::default())?;

    save_settings_to_path(&merged, path)?;
    println!("Config written to {}", path.display());
    if resolved.is_some() {
        println!("Run `elegant auth login --email <EMAIL> --password <PASSWORD>` to sign in.");
    } else {
        println!("No remote configured; notes stay on this device.");
    }
    Ok(())
}

pub fn run_config_show(path: &Path) -> Result<(), CliError> {
    let file = load_settings_from_path(path)?;
    let resolved = resolve_remote_config(file, RemoteSettings::from_env())?;

    println!("config file: {}", path.display());
    let Some(config) = resolved else {
        println!("remote:      not configured (local-only)");
        return Ok(());
    };
    println!("supabase_url:      {}", config.supabase_url);
    println!("supabase_anon_key: {}", mask_key(&config.supabase_anon_key));
    if let Some(share_base_url) = &config.share_base_url {
        println!("share_base_url:    {share_base_url}");
    }
    Ok(())
}

/// Keep the first and last four characters of a key
pub fn mask_key(key: &str) -> String {
    let chars = key.chars().collect::<Vec<_>>();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head = chars[..4].iter().collect::<String>();
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("{head}...{tail}")
}
