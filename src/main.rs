//! Pick'em - command-line entry point

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use pickem::api::{self, AppState};
use pickem::{NewUser, PickemConfig, PickemRepository, Schedule};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = PickemConfig::load(Some(cli.common.config.as_path()))?;
    if let Some(db_path) = cli.common.db_path.clone() {
        config = config.with_database_path(db_path);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    // Config is read before the subscriber exists, so its outcome is logged here
    if !cli.common.config.exists() {
        info!(path = %cli.common.config.display(), "Config file not found, using defaults");
    }
    info!(
        database_path = %config.database_path(),
        host = %config.host(),
        port = config.port(),
        log_filter = %config.log_filter(),
        "Configuration loaded"
    );

    let repository = PickemRepository::new(config.database_path().clone())?;

    match cli.command {
        Command::Serve { port, host } => {
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(host) = host {
                config = config.with_host(host);
            }
            run_server(&config, repository).await
        }
        Command::Migrate => run_migrations(&repository),
        Command::Import { schedule } => run_import(&repository, &schedule),
        Command::AddUser {
            display_name,
            email,
            admin,
        } => run_add_user(&repository, display_name, email, admin),
    }
}

/// Run the HTTP server
#[instrument(skip_all, fields(host = %config.host(), port = config.port()))]
async fn run_server(config: &PickemConfig, repository: PickemRepository) -> Result<()> {
    info!("Starting pick'em server");
    repository.migrate().context("Failed to migrate database")?;

    let state = AppState::new(repository);
    api::serve(config.host(), *config.port(), state).await
}

/// Apply pending migrations
#[instrument(skip_all)]
fn run_migrations(repository: &PickemRepository) -> Result<()> {
    let applied = repository.migrate()?;
    info!(applied, path = %repository.db_path(), "Database up to date");
    Ok(())
}

/// Import a schedule file
#[instrument(skip(repository))]
fn run_import(repository: &PickemRepository, schedule: &std::path::Path) -> Result<()> {
    repository.migrate()?;
    let schedule = Schedule::from_file(schedule)?;
    let summary = schedule.import(repository)?;
    info!(
        teams = summary.teams(),
        games = summary.games(),
        "Schedule import finished"
    );
    Ok(())
}

/// Create a user
#[instrument(skip(repository))]
fn run_add_user(
    repository: &PickemRepository,
    display_name: String,
    email: Option<String>,
    admin: bool,
) -> Result<()> {
    repository.migrate()?;
    let user = repository
        .create_user(NewUser::new(display_name, email, admin))
        .context("Failed to create user")?;
    info!(user_id = user.id(), is_admin = user.is_admin(), "User created");
    println!("{}", user.id());
    Ok(())
}
