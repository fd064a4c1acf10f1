use std::path::PathBuf;

use agenda_core::sync::ConflictPolicy;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agenda")]
#[command(about = "Keep a local agenda in sync with an external calendar")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the sync config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new event
    #[command(alias = "new")]
    Add(AddArgs),
    /// List events ordered by start time
    List {
        /// Include events deleted locally but not yet synced
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing event
    Edit(EditArgs),
    /// Delete an event (removed remotely on next sync)
    Delete {
        /// Event ID or unique ID prefix
        id: String,
    },
    /// Run a full two-way sync against a calendar file
    Sync {
        /// Path to the calendar JSON document
        #[arg(long, value_name = "PATH")]
        remote: PathBuf,
        /// Override the configured conflict policy
        /// (local_wins, remote_wins, newest_wins, manual)
        #[arg(long, value_name = "POLICY")]
        policy: Option<ConflictPolicy>,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or initialize sync configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Event title
    pub title: Vec<String>,
    /// Start time (RFC 3339 or "YYYY-MM-DD HH:MM" UTC)
    #[arg(long, value_name = "TIME")]
    pub start: String,
    /// End time (RFC 3339 or "YYYY-MM-DD HH:MM" UTC)
    #[arg(long, value_name = "TIME")]
    pub end: String,
    /// Category (mirrored as the remote calendar name)
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// RFC 5545 recurrence rule, e.g. FREQ=WEEKLY;BYDAY=MO
    #[arg(long, value_name = "RULE")]
    pub rrule: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Event ID or unique ID prefix
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    /// New start time
    #[arg(long, value_name = "TIME")]
    pub start: Option<String>,
    /// New end time
    #[arg(long, value_name = "TIME")]
    pub end: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective sync config
    Show,
    /// Create or update the sync config file
    Init {
        /// Conflict policy
        #[arg(long, value_name = "POLICY")]
        policy: Option<ConflictPolicy>,
        /// Days before now included in the pull window
        #[arg(long, value_name = "DAYS")]
        past_days: Option<i64>,
        /// Days after now included in the pull window
        #[arg(long, value_name = "DAYS")]
        future_days: Option<i64>,
    },
}
