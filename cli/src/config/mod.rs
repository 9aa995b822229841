//! Configuration management for hospital-admin
//!
//! ## Architecture
//!
//! - `schema` - Configuration data structures
//! - `io` - Reading, writing, and updating the config file
//! - `paths` - Directory path management
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hospital_admin::config;
//!
//! # fn example() -> anyhow::Result<()> {
//! // Load config (returns default if file doesn't exist)
//! let config = config::load_config()?;
//!
//! // Point the CLI at another API deployment
//! config::set_base_url("https://staging.example.org")?;
//! # Ok(())
//! # }
//! ```

pub mod io;
pub mod paths;
pub mod schema;

// Re-export commonly used items
pub use io::{load_config, save_config, set_base_url, update_config};
pub use paths::{get_app_dir, get_config_path};
pub use schema::{AdminConfig, ApiSettings};

/// Environment variable overriding `api.base_url`
pub const BASE_URL_ENV: &str = "HOSPITAL_API_URL";
