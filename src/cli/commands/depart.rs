//! Department roster commands. Edits are validated against a staged
//! roster copy first, so invariant violations never reach the wire.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use dialoguer::Confirm;

use crate::api::RopClient;
use crate::config::Config;
use crate::form::Id;
use crate::org::DepartRoster;

#[derive(Args)]
pub struct DepartCommands {
    #[command(subcommand)]
    pub command: DepartSubcommands,
}

#[derive(Subcommand)]
pub enum DepartSubcommands {
    /// List the organization's departments
    List,
    /// Create a department
    Add { name: String },
    /// Rename a department
    Rename { depart: Id, name: String },
    /// Delete a department
    Delete {
        depart: Id,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn depart_command(
    client: &RopClient,
    _config: &mut Config,
    args: DepartCommands,
) -> Result<()> {
    let org_id = client.org_id().await?;
    let org = client.get_org(org_id).await?;
    let roster = org.roster();

    match args.command {
        DepartSubcommands::List => {
            println!("Departments of {} ({})", org.name.bold(), roster.children.len());
            for depart in &roster.children {
                let marker = if roster.is_default(depart.id) {
                    " (default)".italic().to_string()
                } else {
                    String::new()
                };
                println!("  {:>4}  {}{}", depart.id, depart.name, marker);
            }
            Ok(())
        }
        DepartSubcommands::Add { name } => {
            roster.add(name.as_str())?;
            client.add_depart(org_id, &name).await?;
            println!("Created department {}", name);
            Ok(())
        }
        DepartSubcommands::Rename { depart, name } => {
            roster.rename(depart, name.as_str())?;
            client.rename_depart(org_id, depart, &name).await?;
            println!("Renamed department {} to {}", depart, name);
            Ok(())
        }
        DepartSubcommands::Delete { depart, force } => {
            let name = delete_check(&roster, depart)?;
            if !force
                && !Confirm::new()
                    .with_prompt(format!("Delete department {}?", name))
                    .default(false)
                    .interact()?
            {
                return Ok(());
            }
            client.delete_depart(org_id, depart).await?;
            println!("Deleted department {}", name);
            Ok(())
        }
    }
}

/// Validate the deletion locally and return the department's name.
fn delete_check(roster: &DepartRoster, depart: Id) -> Result<String> {
    let staged = roster.remove(depart)?;
    drop(staged);
    Ok(roster.get(depart).expect("validated by remove").name.clone())
}
