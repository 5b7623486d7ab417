use super::commands::auth::AuthCommands;
use super::commands::depart::DepartCommands;
use super::commands::form::FormCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rop-console")]
#[command(about = "An administrative console for the Rop recruitment platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Session management
    Auth(AuthCommands),
    /// Form catalog and form tree editing
    Form(FormCommands),
    /// Department roster management
    Depart(DepartCommands),
}
