// Use modules from the library crate
use hospital_admin::commands::{
    self, AppContext,
    auth::AuthCommand,
    config::ConfigCommand,
    records::{DoctorCommand, MappingCommand, PatientCommand},
};
use hospital_admin::{config, logging};

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "hospital-admin",
    about = "Manage patients, doctors and their assignments in the hospital records API",
    version
)]
struct Cli {
    /// API base URL, overriding the config file
    #[arg(long, global = true, env = config::BASE_URL_ENV, value_name = "URL")]
    base_url: Option<String>,

    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Show debug logs on the terminal
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Sign in, sign out and inspect the stored session
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Manage patients
    Patients {
        #[command(subcommand)]
        command: PatientCommand,
    },

    /// Manage doctors
    Doctors {
        #[command(subcommand)]
        command: DoctorCommand,
    },

    /// Manage patient-doctor assignments
    Mappings {
        #[command(subcommand)]
        command: MappingCommand,
    },

    /// Show record totals and the most recent records
    Dashboard,

    /// Read and change the CLI configuration
    ///
    /// The config file lives at ~/.config/hospital-admin/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        base_url,
        json,
        verbose,
        command,
    } = Cli::parse();

    logging::init(verbose)?;

    // Config commands work without an API client
    let context = || AppContext::new(base_url.as_deref(), json);

    match command {
        Command::Config { command } => commands::config::handle_config_command(command),
        Command::Auth { command } => {
            commands::auth::handle_auth_command(&context()?, command).await
        }
        Command::Patients { command } => {
            commands::records::handle_patient_command(&context()?, command).await
        }
        Command::Doctors { command } => {
            commands::records::handle_doctor_command(&context()?, command).await
        }
        Command::Mappings { command } => {
            commands::records::handle_mapping_command(&context()?, command).await
        }
        Command::Dashboard => commands::dashboard::show_dashboard(&context()?).await,
    }
}
