//! Common test utilities and fixtures
//!
//! Every command runs with HOME and the XDG directories pointing into a temporary
//! directory, so tests never touch the real config or session.

#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated home directory for one CLI invocation
pub struct TestHome {
    pub dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join("hospital-admin").join("config.toml")
    }

    pub fn session_path(&self) -> PathBuf {
        self.state_dir().join("hospital-admin").join("session.json")
    }

    /// hospital-admin command with the environment confined to this home
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("hospital-admin").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.config_dir())
            .env("XDG_STATE_HOME", self.state_dir())
            .env("XDG_DATA_HOME", self.data_dir())
            .env_remove("HOSPITAL_API_URL")
            .env_remove("HOSPITAL_PASSWORD")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Write a complete session record
    pub fn seed_session(&self, access: &str, refresh: &str) {
        write_session(&self.session_path(), Some(access), Some(refresh));
    }
}

pub fn write_session(path: &Path, access: Option<&str>, refresh: Option<&str>) {
    let user = json!({
        "id": 12,
        "username": "drsmith",
        "email": "smith@example.org",
        "first_name": "Sam",
        "last_name": "Smith"
    })
    .to_string();

    let mut session = json!({ "user": user });
    if let Some(access) = access {
        session["access_token"] = json!(access);
    }
    if let Some(refresh) = refresh {
        session["refresh_token"] = json!(refresh);
    }

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, session.to_string()).unwrap();
}

pub fn patient_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "first_name": name,
        "last_name": "Roe",
        "full_name": format!("{} Roe", name),
        "email": "jane@example.org",
        "phone_number": "555-0100",
        "date_of_birth": "1990-04-12",
        "gender": "F",
        "address": "1 Main St",
        "city": "Springfield",
        "state": "IL",
        "zip_code": "62701",
        "created_by_username": "drsmith",
        "created_at": "2025-03-01T10:00:00Z",
        "updated_at": "2025-03-01T10:00:00Z"
    })
}
