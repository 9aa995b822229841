//! Tracing setup for the hospital-admin CLI
//!
//! Two layers share one `EnvFilter`:
//!
//! - a daily rolling file, `hospital-admin.log.YYYY-MM-DD`, in the platform data dir
//!   (`~/.local/share/hospital-admin/logs/` on Linux)
//! - stderr, capped at WARN so that refresh failures and session expiry are visible
//!   without drowning command output; `--verbose` lowers the cap to DEBUG
//!
//! `RUST_LOG` replaces the default `hospital_admin`/`hospital_client` directives.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "hospital-admin.log";

pub fn init(verbose: bool) -> Result<()> {
    let log_dir = get_log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX))
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(terminal_level(verbose));

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, "logging initialized");
    Ok(())
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "hospital_admin=debug,hospital_client=debug"
    } else {
        "hospital_admin=info,hospital_client=info"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

fn terminal_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

fn get_log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .context("Failed to determine data directory (XDG_DATA_HOME or platform equivalent)")?;
    Ok(data_dir.join("hospital-admin").join("logs"))
}
