//! Standings computed from pick correctness.

use std::collections::HashMap;

use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::db::{DbError, GradedPick, PickemRepository, User};

/// Which games count toward a leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderboardScope {
    /// Every completed game.
    #[default]
    AllTime,
    /// Completed games of one season.
    Season(i32),
    /// Completed games of one week of one season.
    Week {
        /// Week number.
        week: i32,
        /// Season year.
        season: i32,
    },
}

impl LeaderboardScope {
    fn season_and_week(self) -> (Option<i32>, Option<i32>) {
        match self {
            Self::AllTime => (None, None),
            Self::Season(season) => (Some(season), None),
            Self::Week { week, season } => (Some(season), Some(week)),
        }
    }
}

/// One user's line in the standings.
#[derive(Debug, Clone, PartialEq, Getters, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    rank: usize,
    user_id: i32,
    display_name: String,
    correct: u32,
    graded: u32,
    #[getter(skip)]
    accuracy: f64,
}

impl LeaderboardEntry {
    fn new(user: &User, correct: u32, graded: u32) -> Self {
        let accuracy = if graded == 0 {
            0.0
        } else {
            (correct as f64 / graded as f64) * 100.0
        };
        Self {
            rank: 0,
            user_id: *user.id(),
            display_name: user.display_name().clone(),
            correct,
            graded,
            accuracy,
        }
    }

    /// Correct picks as a percentage of graded picks (0.0–100.0).
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }
}

/// Ranked standings.
#[derive(Debug, Clone, Default, Getters, Serialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Ranks every user in `users` by correct picks among `picks`.
    ///
    /// Ordered by correct descending, then graded ascending (fewer misses
    /// ranks higher), then display name. Users tied on both counts share a
    /// rank and the next rank skips accordingly. Picks on ungraded games or
    /// by users not in `users` are ignored.
    #[instrument(skip_all, fields(users = users.len(), picks = picks.len()))]
    pub fn compute(users: &[User], picks: &[GradedPick]) -> Self {
        let mut tally: HashMap<i32, (u32, u32)> =
            users.iter().map(|u| (*u.id(), (0, 0))).collect();

        for graded in picks.iter().filter(|p| p.game().is_graded()) {
            if let Some((correct, total)) = tally.get_mut(graded.pick().user_id()) {
                *total += 1;
                if graded.is_correct() {
                    *correct += 1;
                }
            }
        }

        let mut entries: Vec<LeaderboardEntry> = users
            .iter()
            .map(|user| {
                let (correct, graded) = tally.get(user.id()).copied().unwrap_or_default();
                LeaderboardEntry::new(user, correct, graded)
            })
            .collect();

        entries.sort_by(|a, b| {
            b.correct
                .cmp(&a.correct)
                .then(a.graded.cmp(&b.graded))
                .then_with(|| a.display_name.cmp(&b.display_name))
        });

        assign_ranks(&mut entries);

        debug!(entries = entries.len(), "Leaderboard computed");
        Self { entries }
    }

    /// Loads users and graded picks for `scope` and ranks them.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(repository))]
    pub fn load(repository: &PickemRepository, scope: LeaderboardScope) -> Result<Self, DbError> {
        let (season, week) = scope.season_and_week();
        let users = repository.list_users()?;
        let picks = repository.graded_picks(season, week)?;
        let board = Self::compute(&users, &picks);
        info!(?scope, entries = board.entries.len(), "Leaderboard loaded");
        Ok(board)
    }
}

/// Competition ranking over sorted entries: a tied run takes the rank of its
/// first entry and the next distinct entry takes its position.
fn assign_ranks(entries: &mut [LeaderboardEntry]) {
    for i in 0..entries.len() {
        let tied = i > 0
            && entries[i].correct == entries[i - 1].correct
            && entries[i].graded == entries[i - 1].graded;
        entries[i].rank = if tied { entries[i - 1].rank } else { i + 1 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Game, Pick};
    use chrono::NaiveDate;

    fn user(id: i32, name: &str) -> User {
        User::fixture(id, name)
    }

    fn game(id: i32, home: i32, away: i32, score: Option<(i32, i32)>) -> Game {
        let start = NaiveDate::from_ymd_opt(2026, 9, 13)
            .and_then(|d| d.and_hms_opt(13, 0, 0))
            .expect("valid timestamp");
        let game = Game::fixture(id, 2026, 1, home, away, start);
        match score {
            Some((h, a)) => game.finished(h, a),
            None => game,
        }
    }

    fn graded(user_id: i32, game: &Game, team_id: i32) -> GradedPick {
        GradedPick::new(Pick::fixture(user_id, *game.id(), team_id), game.clone())
    }

    #[test]
    fn ranks_by_correct_then_misses() {
        let users = [user(1, "Ann"), user(2, "Bo"), user(3, "Cy")];
        let g1 = game(10, 100, 200, Some((24, 17)));
        let g2 = game(11, 300, 400, Some((10, 13)));
        let picks = [
            graded(1, &g1, 100),
            graded(1, &g2, 400),
            graded(2, &g1, 100),
            graded(2, &g2, 300),
            graded(3, &g1, 200),
        ];

        let board = Leaderboard::compute(&users, &picks);
        let names: Vec<&str> = board.entries().iter().map(|e| e.display_name().as_str()).collect();
        assert_eq!(names, ["Ann", "Bo", "Cy"]);
        assert_eq!(*board.entries()[0].correct(), 2);
        assert_eq!(*board.entries()[1].correct(), 1);
        assert_eq!(*board.entries()[2].graded(), 1);
        assert!((board.entries()[1].accuracy() - 50.0).abs() < 0.001);
    }

    #[test]
    fn ties_share_rank_and_skip() {
        let users = [user(1, "Ann"), user(2, "Bo"), user(3, "Cy")];
        let g1 = game(10, 100, 200, Some((3, 0)));
        let picks = [graded(1, &g1, 100), graded(2, &g1, 100), graded(3, &g1, 200)];

        let board = Leaderboard::compute(&users, &picks);
        let ranks: Vec<usize> = board.entries().iter().map(|e| *e.rank()).collect();
        assert_eq!(ranks, [1, 1, 3]);
    }

    #[test]
    fn tie_games_grade_every_pick_wrong() {
        let users = [user(1, "Ann")];
        let g1 = game(10, 100, 200, Some((20, 20)));
        let board = Leaderboard::compute(&users, &[graded(1, &g1, 100)]);
        assert_eq!(*board.entries()[0].correct(), 0);
        assert_eq!(*board.entries()[0].graded(), 1);
    }

    #[test]
    fn ungraded_games_and_unknown_users_are_ignored() {
        let users = [user(1, "Ann")];
        let open = game(10, 100, 200, None);
        let done = game(11, 100, 200, Some((1, 0)));
        let board = Leaderboard::compute(&users, &[graded(1, &open, 100), graded(9, &done, 100)]);
        assert_eq!(*board.entries()[0].graded(), 0);
        assert_eq!(board.entries()[0].accuracy(), 0.0);
    }

    #[test]
    fn accuracy_is_part_of_the_json() {
        let users = [user(1, "Ann")];
        let g1 = game(10, 100, 200, Some((24, 17)));
        let g2 = game(11, 100, 200, Some((3, 10)));
        let board = Leaderboard::compute(&users, &[graded(1, &g1, 100), graded(1, &g2, 100)]);

        let json = serde_json::to_value(&board).expect("serializable");
        let entry = &json["entries"][0];
        assert_eq!(entry["accuracy"], 50.0);
        assert_eq!(entry["correct"], 1);
        assert_eq!(entry["graded"], 2);
        assert_eq!(entry["displayName"], "Ann");
    }
}
