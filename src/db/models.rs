//! Database models and domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::Serialize;
use strum::{Display, EnumString};
use tracing::instrument;

use crate::db::schema;

/// Team reference data.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::teams)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    id: i32,
    name: String,
    display_name: String,
    abbreviation: String,
    logo_url: Option<String>,
    color: Option<String>,
}

/// Insertable team. Also used as the changeset when a schedule import
/// refreshes an existing abbreviation.
#[derive(Debug, Clone, Insertable, AsChangeset, new, Getters)]
#[diesel(table_name = schema::teams)]
#[diesel(treat_none_as_null = true)]
pub struct NewTeam {
    name: String,
    display_name: String,
    abbreviation: String,
    logo_url: Option<String>,
    color: Option<String>,
}

/// User profile database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: i32,
    display_name: String,
    email: Option<String>,
    is_admin: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// Insertable user model for creating new users.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    display_name: String,
    email: Option<String>,
    is_admin: bool,
}

#[cfg(test)]
impl User {
    /// Unsaved user for unit tests that don't touch the database.
    pub(crate) fn fixture(id: i32, display_name: &str) -> Self {
        Self {
            id,
            display_name: display_name.to_string(),
            email: None,
            is_admin: false,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }
}

/// Where a game stands relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Kickoff is still ahead; picks are open.
    Scheduled,
    /// Kicked off but no final result yet; picks are locked.
    Locked,
    /// Result recorded.
    Final,
}

/// Scheduled game.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::games)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    id: i32,
    season: i32,
    week: i32,
    home_team_id: i32,
    away_team_id: i32,
    start_time: NaiveDateTime,
    completed: bool,
    home_score: Option<i32>,
    away_score: Option<i32>,
}

impl Game {
    /// True once `now` has reached the scheduled start. Kickoff itself counts
    /// as started.
    #[instrument(skip(self), fields(game_id = self.id, start_time = %self.start_time))]
    pub fn has_started(&self, now: NaiveDateTime) -> bool {
        self.start_time <= now
    }

    /// True when `team_id` is the home or away side.
    pub fn involves(&self, team_id: i32) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    /// Winner of a completed game. `None` while ungraded or on a tie.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn winning_team_id(&self) -> Option<i32> {
        if !self.completed {
            return None;
        }
        match (self.home_score, self.away_score) {
            (Some(home), Some(away)) if home > away => Some(self.home_team_id),
            (Some(home), Some(away)) if away > home => Some(self.away_team_id),
            _ => None,
        }
    }

    /// True when the game is completed and both scores are present.
    pub fn is_graded(&self) -> bool {
        self.completed && self.home_score.is_some() && self.away_score.is_some()
    }

    /// Status of the game as seen at `now`.
    pub fn status(&self, now: NaiveDateTime) -> GameStatus {
        if self.completed {
            GameStatus::Final
        } else if self.has_started(now) {
            GameStatus::Locked
        } else {
            GameStatus::Scheduled
        }
    }
}

#[cfg(test)]
impl Game {
    /// Unsaved game for unit tests that don't touch the database.
    pub(crate) fn fixture(
        id: i32,
        season: i32,
        week: i32,
        home_team_id: i32,
        away_team_id: i32,
        start_time: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            season,
            week,
            home_team_id,
            away_team_id,
            start_time,
            completed: false,
            home_score: None,
            away_score: None,
        }
    }

    /// Same game with a final score recorded.
    pub(crate) fn finished(mut self, home_score: i32, away_score: i32) -> Self {
        self.completed = true;
        self.home_score = Some(home_score);
        self.away_score = Some(away_score);
        self
    }
}

/// Insertable game.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::games)]
pub struct NewGame {
    season: i32,
    week: i32,
    home_team_id: i32,
    away_team_id: i32,
    start_time: NaiveDateTime,
}

/// A user's choice of winner for one game.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Queryable,
    Identifiable,
    Associations,
    Selectable,
    Getters,
    Serialize,
)]
#[diesel(table_name = schema::picks)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Game))]
#[diesel(belongs_to(Team))]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    id: i32,
    user_id: i32,
    game_id: i32,
    team_id: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[cfg(test)]
impl Pick {
    /// Unsaved pick for unit tests that don't touch the database.
    pub(crate) fn fixture(user_id: i32, game_id: i32, team_id: i32) -> Self {
        Self {
            id: user_id * 1000 + game_id,
            user_id,
            game_id,
            team_id,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }
}

/// Insertable pick. `created_at` only lands on first insert; an upsert on an
/// existing (user, game) pair rewrites team and `updated_at` alone.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::picks)]
pub struct NewPick {
    user_id: i32,
    game_id: i32,
    team_id: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// A pick joined with its game and chosen team.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, new)]
pub struct PickDetail {
    pick: Pick,
    game: Game,
    team: Team,
}

/// A pick on a game that has a final result.
#[derive(Debug, Clone, Getters, new)]
pub struct GradedPick {
    pick: Pick,
    game: Game,
}

impl GradedPick {
    /// True when the chosen team won. Ties grade every pick incorrect.
    pub fn is_correct(&self) -> bool {
        self.game.winning_team_id() == Some(*self.pick.team_id())
    }
}

/// Which of a user's picks to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickFilter {
    /// Only the pick for one game.
    Game(i32),
    /// Picks on games in one week of one season.
    Week {
        /// Week number.
        week: i32,
        /// Season year.
        season: i32,
    },
    /// Every pick the user has made.
    All,
}
