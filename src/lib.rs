//! Pick'em - deadline-gated sports picks with leaderboards
//!
//! Users pick the winner of scheduled games up to kickoff; completed games
//! grade the picks into standings.
//!
//! # Architecture
//!
//! - **Picks**: [`PickValidator`] enforces the kickoff deadline and team
//!   participation over a [`PickStore`]
//! - **Storage**: [`PickemRepository`] persists teams, users, games and picks
//!   in SQLite
//! - **Leaderboard**: [`Leaderboard`] ranks users by correct picks
//! - **Schedule**: [`Schedule`] imports teams and games from TOML
//! - **API**: [`api::router`] exposes it all as JSON over HTTP
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use pickem::{PickValidator, PickemRepository};
//!
//! # fn example() -> anyhow::Result<()> {
//! let repository = PickemRepository::new("pickem.db".to_string())?;
//! repository.migrate()?;
//!
//! let validator = PickValidator::new(repository);
//! let pick = validator.submit_pick(1, 42, 7, Utc::now().naive_utc())?;
//! println!("picked {}", pick.team().abbreviation());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
mod clock;
mod config;
mod db;
mod leaderboard;
mod picks;
mod schedule;

// Crate-level exports - Clock
pub use clock::{Clock, FixedClock, SystemClock};

// Crate-level exports - Configuration
pub use config::{ConfigError, PickemConfig};

// Crate-level exports - Storage
pub use db::{
    DbError, DbErrorKind, Game, GameStatus, GradedPick, NewGame, NewPick, NewTeam, NewUser, Pick,
    PickDetail, PickFilter, PickemRepository, Team, Transaction, User,
};

// Crate-level exports - Leaderboard
pub use leaderboard::{Leaderboard, LeaderboardEntry, LeaderboardScope};

// Crate-level exports - Pick rules
pub use picks::{PickError, PickStore, PickValidator, PickWindowOpen, TeamInGame};

// Crate-level exports - Schedule import
pub use schedule::{GameEntry, ImportError, ImportSummary, Schedule, TeamEntry};
