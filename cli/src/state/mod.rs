//! XDG state directory management for hospital-admin
//!
//! The session record (tokens and user) lives here, separate from the config.
//!
//! ## Directory Locations
//!
//! **macOS:**
//! - `~/Library/Application Support/hospital-admin/` (dirs::data_local_dir)
//!
//! **Linux/Unix:**
//! - `$XDG_STATE_HOME/hospital-admin/` (if XDG_STATE_HOME is set)
//! - `~/.local/state/hospital-admin/` (default fallback)
//!
//! **Windows:**
//! - `%LOCALAPPDATA%\hospital-admin\` via dirs::data_local_dir

use anyhow::{Context, Result};
use hospital_client::FileSessionStore;
use std::path::PathBuf;

const APP_DIR: &str = "hospital-admin";

/// Get the XDG state directory for hospital-admin
pub fn get_state_dir() -> Result<PathBuf> {
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        // The dirs crate doesn't have state_dir() on every platform, so follow the XDG base directory convention
        if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
            if !xdg_state.is_empty() {
                return Ok(PathBuf::from(xdg_state).join(APP_DIR));
            }
        }

        Ok(dirs::home_dir()
            .context("Failed to get home directory")?
            .join(".local")
            .join("state")
            .join(APP_DIR))
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    {
        Ok(dirs::data_local_dir()
            .context("Failed to get data local directory")?
            .join(APP_DIR))
    }
}

/// Path of the session file
pub fn get_session_path() -> Result<PathBuf> {
    Ok(get_state_dir()?.join("session.json"))
}

/// Session store backed by the session file
pub fn session_store() -> Result<FileSessionStore> {
    Ok(FileSessionStore::new(get_session_path()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_state_dir() {
        let state_dir = get_state_dir().expect("Failed to get state dir");
        assert!(state_dir.ends_with("hospital-admin"));
    }

    #[test]
    fn test_session_path_is_in_state_dir() {
        let path = get_session_path().unwrap();
        assert_eq!(path.parent().unwrap(), get_state_dir().unwrap());
        assert!(path.ends_with("session.json"));
    }
}
