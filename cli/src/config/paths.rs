//! Directory path management for hospital-admin
//!
//! All config paths used by the CLI are centralized here.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the base config directory (~/.config/hospital-admin/)
pub fn get_app_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Failed to get config directory")?
        .join("hospital-admin"))
}

/// Get the config file path (~/.config/hospital-admin/config.toml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_app_dir()?.join("config.toml"))
}
