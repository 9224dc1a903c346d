//! Schedule import from a TOML file.
//!
//! ```toml
//! [[teams]]
//! abbreviation = "KC"
//! name = "Chiefs"
//! display_name = "Kansas City Chiefs"
//! color = "#E31837"
//!
//! [[games]]
//! season = 2026
//! week = 1
//! home = "KC"
//! away = "BAL"
//! start_time = "2026-09-10T00:20:00"
//! ```
//!
//! Teams are keyed by abbreviation (case-insensitive, stored uppercase) and
//! games by (season, week, home, away), so importing the same file twice
//! changes nothing and importing a revised file moves kickoffs instead of
//! duplicating games.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::db::{DbError, NewGame, NewTeam, PickemRepository};

/// Parsed schedule file.
#[derive(Debug, Clone, Default, Deserialize, Getters)]
pub struct Schedule {
    #[serde(default)]
    teams: Vec<TeamEntry>,
    #[serde(default)]
    games: Vec<GameEntry>,
}

/// One `[[teams]]` entry.
#[derive(Debug, Clone, Deserialize, Getters)]
pub struct TeamEntry {
    abbreviation: String,
    name: String,
    display_name: String,
    #[serde(default)]
    logo_url: Option<String>,
    #[serde(default)]
    color: Option<String>,
}

/// One `[[games]]` entry. Teams are referenced by abbreviation.
#[derive(Debug, Clone, Deserialize, Getters)]
pub struct GameEntry {
    season: i32,
    week: i32,
    home: String,
    away: String,
    start_time: NaiveDateTime,
}

/// Counts of rows written by an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Getters)]
pub struct ImportSummary {
    teams: usize,
    games: usize,
}

/// Schedule import error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Import error: {} at {}:{}", message, file, line)]
pub struct ImportError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ImportError {
    /// Creates a new import error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<DbError> for ImportError {
    #[track_caller]
    fn from(err: DbError) -> Self {
        Self::new(err.to_string())
    }
}

impl Schedule {
    /// Parses a schedule from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] if the text is not a valid schedule.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ImportError> {
        let schedule: Self = toml::from_str(content)
            .map_err(|e| ImportError::new(format!("Failed to parse schedule: {}", e)))?;
        debug!(
            teams = schedule.teams.len(),
            games = schedule.games.len(),
            "Schedule parsed"
        );
        Ok(schedule)
    }

    /// Reads and parses a schedule file.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ImportError::new(format!("Failed to read schedule: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Writes the schedule into `repository`.
    ///
    /// Abbreviations are matched case-insensitively and stored uppercase.
    /// Every game is checked before anything is written: both teams must
    /// be defined in the file or already stored, and must differ. The writes
    /// then run in one transaction, so a failed import leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] if a game is invalid or a database error occurs.
    #[instrument(
        skip(self, repository),
        fields(teams = self.teams.len(), games = self.games.len())
    )]
    pub fn import(&self, repository: &PickemRepository) -> Result<ImportSummary, ImportError> {
        let mut known: HashMap<String, Option<i32>> = self
            .teams
            .iter()
            .map(|t| (normalize(&t.abbreviation), None))
            .collect();

        for game in &self.games {
            let (home, away) = (normalize(&game.home), normalize(&game.away));
            if home == away {
                return Err(ImportError::new(format!(
                    "Season {} week {}: {} cannot play itself",
                    game.season, game.week, home
                )));
            }
            for abbreviation in [home, away] {
                if known.contains_key(&abbreviation) {
                    continue;
                }
                let stored = repository.get_team_by_abbreviation(&abbreviation)?.ok_or_else(|| {
                    ImportError::new(format!(
                        "Season {} week {}: unknown team '{}'",
                        game.season, game.week, abbreviation
                    ))
                })?;
                known.insert(abbreviation, Some(*stored.id()));
            }
        }

        let summary = repository.transaction(|tx| {
            let mut summary = ImportSummary::default();

            for entry in &self.teams {
                let abbreviation = normalize(&entry.abbreviation);
                let team = tx.upsert_team(&NewTeam::new(
                    entry.name.clone(),
                    entry.display_name.clone(),
                    abbreviation.clone(),
                    entry.logo_url.clone(),
                    entry.color.clone(),
                ))?;
                known.insert(abbreviation, Some(*team.id()));
                summary.teams += 1;
            }

            for entry in &self.games {
                let home = team_id(&known, &entry.home)?;
                let away = team_id(&known, &entry.away)?;
                tx.upsert_game(&NewGame::new(
                    entry.season,
                    entry.week,
                    home,
                    away,
                    entry.start_time,
                ))?;
                summary.games += 1;
            }

            Ok(summary)
        })?;

        info!(teams = summary.teams, games = summary.games, "Schedule imported");
        Ok(summary)
    }
}

fn normalize(abbreviation: &str) -> String {
    abbreviation.trim().to_uppercase()
}

fn team_id(known: &HashMap<String, Option<i32>>, abbreviation: &str) -> Result<i32, DbError> {
    known
        .get(&normalize(abbreviation))
        .copied()
        .flatten()
        .ok_or_else(|| DbError::new(format!("Team '{}' was not resolved", abbreviation)))
}
