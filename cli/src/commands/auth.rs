//! Session commands: login, register, logout, whoami, status

use anyhow::{Context, Result};
use clap::Parser;
use hospital_client::types::RegisterForm;

use super::{AppContext, LOGIN_HINT};
use crate::output;

#[derive(Parser)]
pub enum AuthCommand {
    /// Sign in and store the session
    Login {
        /// Account username
        username: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long, env = "HOSPITAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and store the session
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long, env = "HOSPITAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Remove the stored session
    Logout,

    /// Show the signed-in user as reported by the server
    Whoami,

    /// Show whether a session is stored, without contacting the server
    Status,
}

pub async fn handle_auth_command(ctx: &AppContext, command: AuthCommand) -> Result<()> {
    match command {
        AuthCommand::Login { username, password } => {
            let password = password_or_prompt(password)?;
            let response = ctx
                .auth
                .login(&username, &password)
                .await
                .context("Login failed")?;

            if ctx.json {
                return output::print_json(&response.user);
            }
            println!("Logged in as {}", response.user.display_name());
            Ok(())
        }

        AuthCommand::Register {
            username,
            email,
            first_name,
            last_name,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let form = RegisterForm {
                username,
                email,
                password2: password.clone(),
                password,
                first_name,
                last_name,
            };
            let response = ctx
                .auth
                .register(&form)
                .await
                .context("Registration failed")?;

            if ctx.json {
                return output::print_json(&response.user);
            }
            println!(
                "{}",
                response
                    .message
                    .as_deref()
                    .unwrap_or("Registration successful")
            );
            println!("Logged in as {}", response.user.display_name());
            Ok(())
        }

        AuthCommand::Logout => {
            ctx.auth.logout().context("Failed to remove session")?;
            println!("Logged out");
            Ok(())
        }

        AuthCommand::Whoami => {
            ctx.require_login()?;
            let user = ctx
                .auth
                .profile()
                .await
                .context("Failed to fetch profile")?;

            if ctx.json {
                return output::print_json(&user);
            }
            output::print_user(&user);
            Ok(())
        }

        AuthCommand::Status => {
            let user = ctx
                .auth
                .current_user()
                .context("Failed to read session")?;
            let authenticated = ctx
                .auth
                .is_authenticated()
                .context("Failed to read session")?;

            match (authenticated, user) {
                (true, Some(user)) => {
                    println!("Logged in as {} ({})", user.display_name(), user.username)
                }
                (true, None) => println!("Logged in"),
                (false, _) => println!("Not logged in, {}", LOGIN_HINT),
            }
            Ok(())
        }
    }
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    // Reads from the terminal with echo disabled
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    if password.is_empty() {
        anyhow::bail!("password cannot be empty");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplied_password_skips_prompt() {
        let password = password_or_prompt(Some("s3cret".to_string())).unwrap();
        assert_eq!(password, "s3cret");
    }
}
