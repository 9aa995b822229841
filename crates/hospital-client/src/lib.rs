//! Client for the hospital records REST API
//!
//! The [`AuthenticatedClient`] attaches the stored access token to every request and, on a
//! 401, refreshes it once and retries. When the session cannot be recovered the stored
//! credentials are cleared and the host's [`SessionExpiredHandler`] is told where to send
//! the user to log in again.
//!
//! ```no_run
//! use std::sync::Arc;
//! use hospital_client::{
//!     AuthService, AuthenticatedClient, ClientConfig, MemorySessionStore, RecordsApi,
//!     SessionExpired,
//! };
//!
//! # async fn example() -> hospital_client::Result<()> {
//! let config = ClientConfig::new("https://hospital-backend-app.vercel.app")?;
//! let client = AuthenticatedClient::builder(config, Arc::new(MemorySessionStore::new()))
//!     .on_session_expired(|event: &SessionExpired| {
//!         eprintln!("session expired, log in again at {}", event.login_path);
//!     })
//!     .build()?;
//!
//! AuthService::new(client.clone()).login("admin", "secret").await?;
//! let patients = RecordsApi::new(client).patients.list().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod dashboard;
pub mod error;
pub mod session;
pub mod token;
pub mod types;

pub use api::{DoctorsApi, MappingsApi, PatientsApi, RecordsApi, Saved};
pub use auth::AuthService;
pub use client::{
    ApiRequest, AuthenticatedClient, ClientConfig, DEFAULT_BASE_URL, DEFAULT_LOGIN_PATH,
    ExpiryReason, RefreshPolicy, SessionExpired, SessionExpiredHandler,
};
pub use dashboard::{Dashboard, DashboardStats};
pub use error::{ClientError, Result};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionKey, SessionStore, StoreError};
pub use token::BearerToken;
