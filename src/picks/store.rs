//! Storage seam consumed by [`PickValidator`](super::PickValidator).

use chrono::NaiveDateTime;

use crate::db::{DbError, Game, Pick, PickDetail, PickFilter, PickemRepository, Team};

/// Storage operations the pick rules depend on.
///
/// `upsert_pick` must be atomic for concurrent callers on the same
/// (user, game) key; the validator issues exactly one call and relies on it.
pub trait PickStore {
    /// Looks up a game by id.
    fn find_game(&self, game_id: i32) -> Result<Option<Game>, DbError>;

    /// Looks up a team by id.
    fn find_team(&self, team_id: i32) -> Result<Option<Team>, DbError>;

    /// Creates the pick for (user, game), or overwrites its team.
    fn upsert_pick(
        &self,
        user_id: i32,
        game_id: i32,
        team_id: i32,
        now: NaiveDateTime,
    ) -> Result<Pick, DbError>;

    /// Removes the pick for (user, game). `false` when there was none.
    fn delete_pick(&self, user_id: i32, game_id: i32) -> Result<bool, DbError>;

    /// A user's picks, most recent first.
    fn list_picks(&self, user_id: i32, filter: PickFilter) -> Result<Vec<PickDetail>, DbError>;
}

impl PickStore for PickemRepository {
    fn find_game(&self, game_id: i32) -> Result<Option<Game>, DbError> {
        self.get_game(game_id)
    }

    fn find_team(&self, team_id: i32) -> Result<Option<Team>, DbError> {
        self.get_team(team_id)
    }

    fn upsert_pick(
        &self,
        user_id: i32,
        game_id: i32,
        team_id: i32,
        now: NaiveDateTime,
    ) -> Result<Pick, DbError> {
        PickemRepository::upsert_pick(self, user_id, game_id, team_id, now)
    }

    fn delete_pick(&self, user_id: i32, game_id: i32) -> Result<bool, DbError> {
        PickemRepository::delete_pick(self, user_id, game_id)
    }

    fn list_picks(&self, user_id: i32, filter: PickFilter) -> Result<Vec<PickDetail>, DbError> {
        PickemRepository::list_picks(self, user_id, filter)
    }
}
