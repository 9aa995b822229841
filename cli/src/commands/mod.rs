//! Command handlers for the hospital-admin CLI
//!
//! Every handler receives an [`AppContext`], which owns the authenticated client and the
//! services built on top of it.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod records;

use anyhow::{Context, Result};
use hospital_client::{
    AuthService, AuthenticatedClient, ClientError, RecordsApi, SessionExpired,
};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{config as app_config, state};

/// Hint printed whenever the user has to sign in again
pub const LOGIN_HINT: &str = "run `hospital-admin auth login` to sign in";

/// Shared state for a single CLI invocation
pub struct AppContext {
    pub auth: AuthService,
    pub records: RecordsApi,
    pub json: bool,
}

impl AppContext {
    /// Build the client from the config file, the optional base URL override and the
    /// session file in the state directory.
    pub fn new(base_url_override: Option<&str>, json: bool) -> Result<Self> {
        let config = app_config::load_config()?;
        let client_config = config.client_config(base_url_override)?;
        let store = state::session_store()?;

        tracing::debug!(
            base_url = client_config.base_url(),
            session = %store.path().display(),
            "building API client"
        );

        let client = AuthenticatedClient::builder(client_config, Arc::new(store))
            .on_session_expired(report_session_expired)
            .build()
            .context("Failed to create API client")?;

        Ok(Self {
            auth: AuthService::new(client.clone()),
            records: RecordsApi::new(client),
            json,
        })
    }

    /// Fail early with a login hint when no session is stored
    pub fn require_login(&self) -> Result<()> {
        match self.auth.require_authenticated() {
            Ok(()) => Ok(()),
            Err(ClientError::NotAuthenticated { .. }) => {
                anyhow::bail!("Not logged in, {}", LOGIN_HINT)
            }
            Err(e) => Err(e).context("Failed to read session"),
        }
    }
}

fn report_session_expired(event: &SessionExpired) {
    tracing::warn!(reason = %event.reason, login_path = %event.login_path, "session expired");
    eprintln!("Session expired ({}), {}", event.reason, LOGIN_HINT);
}

/// JSON body for create and update commands
#[derive(clap::Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct JsonInput {
    /// Read the JSON body from a file (`-` for stdin)
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Inline JSON body
    #[arg(long, short = 'd', value_name = "JSON")]
    pub data: Option<String>,
}

impl JsonInput {
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        let (source, content) = match (&self.data, &self.file) {
            (Some(data), _) => ("--data".to_string(), data.clone()),
            (None, Some(path)) if path.as_os_str() == "-" => {
                let mut content = String::new();
                std::io::stdin()
                    .read_to_string(&mut content)
                    .context("Failed to read JSON from stdin")?;
                ("stdin".to_string(), content)
            }
            (None, Some(path)) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                (path.display().to_string(), content)
            }
            (None, None) => anyhow::bail!("either --file or --data is required"),
        };

        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", source))
    }
}
