#![allow(warnings)]

use anyhow::Result;
use clap::Parser;
use log::info;

use rop_console::api::{self, DEFAULT_API_BASE};
use rop_console::cli::{Cli, Commands};
use rop_console::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("rop-console.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    info!("Starting rop-console");

    let mut config = Config::load()?;
    let base_url = config
        .api_base
        .clone()
        .or_else(|| std::env::var("ROP_API_BASE").ok())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    // Restore the cached session, if any, and hand it to the client.
    let handle = match config.session() {
        Some(session) => session.into_handle(),
        None => api::empty_handle(),
    };
    let client = api::RopClient::new(base_url, handle.clone());

    let result = match cli.command {
        Commands::Auth(args) => {
            rop_console::cli::commands::auth_command(&client, &mut config, args).await
        }
        Commands::Form(args) => {
            rop_console::cli::commands::form_command(&client, &mut config, args).await
        }
        Commands::Depart(args) => {
            rop_console::cli::commands::depart_command(&client, &mut config, args).await
        }
    };

    // The server may have pushed a refreshed token mid-command; persist it
    // even when the command itself failed.
    if let Some(session) = handle.read().await.as_ref() {
        if config.token.as_deref() != Some(session.token()) {
            config.remember_session(session)?;
        }
    }

    result
}
