//! Session management commands: login, logout, status.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use dialoguer::Input;
use log::info;

use crate::api::{AuthClient, RopClient};
use crate::config::Config;

#[derive(Args)]
pub struct AuthCommands {
    #[command(subcommand)]
    pub command: AuthSubcommands,
}

#[derive(Subcommand)]
pub enum AuthSubcommands {
    /// Log into an organization
    Login {
        /// Account name (prompted when omitted)
        #[arg(long)]
        account: Option<String>,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Drop the cached session
    Logout,
    /// Show the current session
    Status,
}

pub async fn auth_command(
    client: &RopClient,
    config: &mut Config,
    args: AuthCommands,
) -> Result<()> {
    match args.command {
        AuthSubcommands::Login { account, password } => {
            login_command(client, config, account, password).await
        }
        AuthSubcommands::Logout => logout_command(client, config).await,
        AuthSubcommands::Status => status_command(config),
    }
}

async fn login_command(
    client: &RopClient,
    config: &mut Config,
    account: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let account = match account {
        Some(account) => account,
        None => Input::new().with_prompt("Account").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };

    let session = AuthClient::new(client.base_url()).login(&account, &password).await?;
    info!("Logged into organization {}", session.org_id());

    config.remember_session(&session)?;
    println!(
        "Logged in as {} (organization {}, level {})",
        session.nickname().bright_green().bold(),
        session.org_id(),
        session.level()
    );
    *client.session().write().await = Some(session);
    Ok(())
}

async fn logout_command(client: &RopClient, config: &mut Config) -> Result<()> {
    *client.session().write().await = None;
    config.clear_session()?;
    println!("Logged out.");
    Ok(())
}

fn status_command(config: &Config) -> Result<()> {
    match config.session() {
        Some(session) => {
            println!("Logged in as {}", session.nickname().bright_green().bold());
            println!("  Organization: {}", session.org_id());
            println!("  Permission level: {}", session.level());
            if let Some(form) = config.last_form {
                println!("  Last form: {}", form);
            }
        }
        None => println!("{}", "Not logged in.".yellow()),
    }
    Ok(())
}
