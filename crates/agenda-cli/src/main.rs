//! Agenda CLI - Command-line interface for a locally kept, two-way synced
//! agenda.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{resolve_config_path, resolve_db_path};
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` directives plus a default for our own crates
fn log_filter(default_directive: &str) -> Result<EnvFilter, CliError> {
    let directive = default_directive
        .parse::<Directive>()
        .map_err(|error| CliError::Config(format!("invalid log filter: {error}")))?;
    Ok(EnvFilter::from_default_env().add_directive(directive))
}

async fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter("agenda=info")?)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config)?;
    let db_path = resolve_db_path(cli.db_path)?;

    match cli.command {
        Commands::Add(args) => run_add(args, &db_path).await?,
        Commands::List { all, json } => run_list(all, json, &db_path).await?,
        Commands::Edit(args) => run_edit(args, &db_path).await?,
        Commands::Delete { id } => run_delete(&id, &db_path).await?,
        Commands::Sync {
            remote,
            policy,
            json,
        } => run_sync(&remote, policy, json, &db_path, &config_path).await?,
        Commands::Config { command } => run_config(command, &config_path)?,
    }

    Ok(())
}
