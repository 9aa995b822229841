//! Configuration schema for hospital-admin
//!
//! All fields use `#[serde(default)]` so a partial config file is valid.

use anyhow::{Context, Result};
use hospital_client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_LOGIN_PATH, RefreshPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub api: ApiSettings,
}

/// `[api]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Root of the records API (scheme and host)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Login entry point reported when a session expires
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// `single-flight` or `per-request`
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            login_path: default_login_path(),
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

impl AdminConfig {
    /// Validate the configuration for common errors
    ///
    /// Returns Ok(()) if valid, or Err with a list of error messages
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = validate_base_url(&self.api.base_url) {
            errors.push(e);
        }

        if self.api.timeout_secs == 0 {
            errors.push("api.timeout_secs must be greater than 0".to_string());
        }

        if !self.api.login_path.starts_with('/') {
            errors.push(format!(
                "api.login_path '{}' must start with '/'",
                self.api.login_path
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Build the client configuration, with an optional base URL override.
    pub fn client_config(&self, base_url_override: Option<&str>) -> Result<ClientConfig> {
        let base_url = base_url_override.unwrap_or(&self.api.base_url);
        let mut config = ClientConfig::new(base_url)
            .with_context(|| format!("Invalid API base URL '{}'", base_url))?;

        config.timeout = Duration::from_secs(self.api.timeout_secs);
        config.login_path = self.api.login_path.clone();
        config.refresh_policy = self.api.refresh_policy;
        Ok(config)
    }
}

/// Base URLs must be absolute http(s) URLs
pub fn validate_base_url(base_url: &str) -> Result<(), String> {
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(format!(
            "api.base_url '{}' must start with http:// or https://",
            base_url
        ));
    }

    ClientConfig::new(base_url)
        .map(|_| ())
        .map_err(|e| format!("api.base_url is invalid: {}", e))
}
