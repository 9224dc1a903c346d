//! Command-line interface for pickem.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Pick'em - sports picks server
#[derive(Parser, Debug)]
#[command(name = "pickem")]
#[command(about = "Deadline-gated sports pick'em server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub common: CommonArgs,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to the TOML config file (defaults apply if it doesn't exist)
    #[arg(short, long, global = true, default_value = "pickem.toml")]
    pub config: PathBuf,

    /// Override the database path
    #[arg(long, global = true)]
    pub db_path: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (applies pending migrations first)
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Apply pending database migrations
    Migrate,

    /// Import teams and games from a schedule TOML file
    Import {
        /// Schedule file
        schedule: PathBuf,
    },

    /// Create a user
    AddUser {
        /// Unique display name
        display_name: String,

        /// Contact email
        #[arg(long)]
        email: Option<String>,

        /// Grant administrator access
        #[arg(long)]
        admin: bool,
    },
}
