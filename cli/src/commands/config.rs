use anyhow::Result;
use clap::Parser;

use crate::config;

#[derive(Parser)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Set the API base URL
    SetUrl {
        /// Base URL, e.g. https://hospital-backend-app.vercel.app
        url: String,
    },

    /// Print the config file location
    Path,
}

pub fn handle_config_command(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = config::load_config()?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigCommand::SetUrl { url } => {
            config::set_base_url(&url)?;
            println!("API base URL set to {}", url.trim_end_matches('/'));
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", config::get_config_path()?.display());
            Ok(())
        }
    }
}
