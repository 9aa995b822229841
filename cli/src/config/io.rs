//! Configuration file I/O operations
//!
//! All operations include automatic validation.

use super::paths::get_config_path;
use super::schema::{AdminConfig, validate_base_url};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load configuration from the default location
///
/// Returns a default config if the file doesn't exist.
pub fn load_config() -> Result<AdminConfig> {
    load_config_from(&get_config_path()?)
}

/// Load configuration from a specific file
pub fn load_config_from(path: &Path) -> Result<AdminConfig> {
    if !path.exists() {
        return Ok(AdminConfig::default());
    }

    let content =
        fs::read_to_string(path).context(format!("Failed to read config: {}", path.display()))?;

    let config: AdminConfig =
        toml::from_str(&content).context(format!("Failed to parse config: {}", path.display()))?;

    if let Err(errors) = config.validate() {
        anyhow::bail!(
            "Config validation failed in {}:\n  {}",
            path.display(),
            errors.join("\n  ")
        );
    }

    Ok(config)
}

/// Save configuration to the default location
pub fn save_config(config: &AdminConfig) -> Result<()> {
    save_config_to(config, &get_config_path()?)
}

/// Save configuration to a specific file
///
/// Creates parent directories if needed.
/// Validates the config before saving.
pub fn save_config_to(config: &AdminConfig, path: &Path) -> Result<()> {
    if let Err(errors) = config.validate() {
        anyhow::bail!("cannot save invalid config:\n  {}", errors.join("\n  "));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(format!(
            "Failed to create config directory: {}",
            parent.display()
        ))?;
    }

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, content).context(format!("Failed to write config: {}", path.display()))?;

    Ok(())
}

/// Update config with a modification function
///
/// This handles the load → modify → validate → save cycle.
pub fn update_config<F>(f: F) -> Result<()>
where
    F: FnOnce(&mut AdminConfig) -> Result<()>,
{
    let mut config = load_config()?;
    f(&mut config)?;
    save_config(&config)?;
    Ok(())
}

/// Point the CLI at another API deployment
pub fn set_base_url(base_url: &str) -> Result<()> {
    validate_base_url(base_url).map_err(anyhow::Error::msg)?;

    update_config(|config| {
        config.api.base_url = base_url.trim_end_matches('/').to_string();
        Ok(())
    })
}
