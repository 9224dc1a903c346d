//! Pick rules and the validator that applies them.

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument, warn};

use super::{PickError, PickStore};
use crate::db::{DbError, Game, PickDetail, PickFilter};

// ─────────────────────────────────────────────────────────────
//  Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the game has not reached its scheduled start.
///
/// Locks at kickoff, not on completion.
pub struct PickWindowOpen;

impl PickWindowOpen {
    /// Fails with [`PickError::GameAlreadyStarted`] once `start_time <= now`.
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(game: &Game, now: NaiveDateTime) -> Result<(), PickError> {
        if game.has_started(now) {
            Err(PickError::GameAlreadyStarted {
                game_id: *game.id(),
            })
        } else {
            Ok(())
        }
    }
}

/// Precondition: the chosen team plays in the game.
pub struct TeamInGame;

impl TeamInGame {
    /// Fails with [`PickError::InvalidTeamSelection`] unless `team_id` is the
    /// home or away side.
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(game: &Game, team_id: i32) -> Result<(), PickError> {
        if game.involves(team_id) {
            Ok(())
        } else {
            Err(PickError::InvalidTeamSelection {
                game_id: *game.id(),
                team_id,
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Validator
// ─────────────────────────────────────────────────────────────

/// Applies the pick rules against a [`PickStore`].
///
/// Holds no state between calls beyond the store handle.
#[derive(Debug, Clone)]
pub struct PickValidator<S> {
    store: S,
}

impl<S: PickStore> PickValidator<S> {
    /// Creates a validator over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(skip(self))]
    fn require_game(&self, game_id: i32) -> Result<Game, PickError> {
        self.store
            .find_game(game_id)?
            .ok_or(PickError::GameNotFound { game_id })
    }

    /// Creates or changes the user's pick for a game.
    ///
    /// Checks, in order: the game exists, it has not started at `now`, and
    /// `team_id` plays in it. Then upserts on (user, game) and returns the
    /// stored pick with its game and team.
    ///
    /// # Errors
    ///
    /// [`PickError::GameNotFound`], [`PickError::GameAlreadyStarted`],
    /// [`PickError::InvalidTeamSelection`], or [`PickError::Storage`].
    #[instrument(skip(self), fields(now = %now))]
    pub fn submit_pick(
        &self,
        user_id: i32,
        game_id: i32,
        team_id: i32,
        now: NaiveDateTime,
    ) -> Result<PickDetail, PickError> {
        debug!("Validating pick submission");
        let game = self.require_game(game_id)?;

        if let Err(e) = PickWindowOpen::check(&game, now)
            .and_then(|()| TeamInGame::check(&game, team_id))
        {
            warn!(error = %e, start_time = %game.start_time(), "Pick rejected");
            return Err(e);
        }

        let pick = self.store.upsert_pick(user_id, game_id, team_id, now)?;
        let team = self.store.find_team(team_id)?.ok_or_else(|| {
            DbError::new(format!("Team {} vanished while storing pick", team_id))
        })?;

        info!(pick_id = pick.id(), team = %team.abbreviation(), "Pick accepted");
        Ok(PickDetail::new(pick, game, team))
    }

    /// Removes the user's pick for a game.
    ///
    /// Uses the same kickoff deadline as [`submit_pick`](Self::submit_pick),
    /// so a pick cannot be withdrawn once it could no longer be made.
    ///
    /// # Errors
    ///
    /// [`PickError::GameNotFound`], [`PickError::GameAlreadyStarted`],
    /// [`PickError::PickNotFound`], or [`PickError::Storage`].
    #[instrument(skip(self), fields(now = %now))]
    pub fn retract_pick(
        &self,
        user_id: i32,
        game_id: i32,
        now: NaiveDateTime,
    ) -> Result<(), PickError> {
        debug!("Validating pick retraction");
        let game = self.require_game(game_id)?;

        if let Err(e) = PickWindowOpen::check(&game, now) {
            warn!(error = %e, start_time = %game.start_time(), "Retraction rejected");
            return Err(e);
        }

        if !self.store.delete_pick(user_id, game_id)? {
            debug!("No pick to retract");
            return Err(PickError::PickNotFound { user_id, game_id });
        }

        info!("Pick retracted");
        Ok(())
    }

    /// Lists the user's picks matching `filter`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`PickError::Storage`] if the store fails.
    #[instrument(skip(self))]
    pub fn list_picks(
        &self,
        user_id: i32,
        filter: PickFilter,
    ) -> Result<Vec<PickDetail>, PickError> {
        let picks = self.store.list_picks(user_id, filter)?;
        debug!(count = picks.len(), "Picks listed");
        Ok(picks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Pick, Team};
    use chrono::{Duration, NaiveDate};
    use std::cell::RefCell;

    fn kickoff() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 9, 13)
            .and_then(|d| d.and_hms_opt(17, 0, 0))
            .expect("valid timestamp")
    }

    /// Store that only knows one game and counts write calls.
    struct OneGameStore {
        game: Game,
        upserts: RefCell<u32>,
        deletes: RefCell<u32>,
    }

    impl PickStore for OneGameStore {
        fn find_game(&self, game_id: i32) -> Result<Option<Game>, DbError> {
            Ok((*self.game.id() == game_id).then(|| self.game.clone()))
        }

        fn find_team(&self, _team_id: i32) -> Result<Option<Team>, DbError> {
            Err(DbError::new("unused"))
        }

        fn upsert_pick(
            &self,
            _user_id: i32,
            _game_id: i32,
            _team_id: i32,
            _now: NaiveDateTime,
        ) -> Result<Pick, DbError> {
            *self.upserts.borrow_mut() += 1;
            Err(DbError::new("write attempted"))
        }

        fn delete_pick(&self, _user_id: i32, _game_id: i32) -> Result<bool, DbError> {
            *self.deletes.borrow_mut() += 1;
            Ok(false)
        }

        fn list_picks(
            &self,
            _user_id: i32,
            _filter: PickFilter,
        ) -> Result<Vec<PickDetail>, DbError> {
            Ok(Vec::new())
        }
    }

    fn store() -> OneGameStore {
        OneGameStore {
            game: Game::fixture(7, 2026, 1, 1, 2, kickoff()),
            upserts: RefCell::new(0),
            deletes: RefCell::new(0),
        }
    }

    #[test]
    fn window_closes_exactly_at_kickoff() {
        let store = store();
        assert!(PickWindowOpen::check(&store.game, kickoff() - Duration::seconds(1)).is_ok());
        assert!(matches!(
            PickWindowOpen::check(&store.game, kickoff()),
            Err(PickError::GameAlreadyStarted { game_id: 7 })
        ));
    }

    #[test]
    fn team_must_be_home_or_away() {
        let store = store();
        assert!(TeamInGame::check(&store.game, 1).is_ok());
        assert!(TeamInGame::check(&store.game, 2).is_ok());
        assert!(matches!(
            TeamInGame::check(&store.game, 3),
            Err(PickError::InvalidTeamSelection { team_id: 3, .. })
        ));
    }

    #[test]
    fn rejected_submissions_never_reach_the_store() {
        let validator = PickValidator::new(store());

        let late = validator.submit_pick(1, 7, 1, kickoff());
        assert!(matches!(late, Err(PickError::GameAlreadyStarted { .. })));

        let wrong_team = validator.submit_pick(1, 7, 99, kickoff() - Duration::minutes(5));
        assert!(matches!(wrong_team, Err(PickError::InvalidTeamSelection { .. })));

        let missing = validator.submit_pick(1, 8, 1, kickoff() - Duration::minutes(5));
        assert!(matches!(missing, Err(PickError::GameNotFound { game_id: 8 })));

        assert_eq!(*validator.store().upserts.borrow(), 0);
    }

    #[test]
    fn deadline_is_checked_before_team() {
        let validator = PickValidator::new(store());
        let result = validator.submit_pick(1, 7, 99, kickoff() + Duration::hours(1));
        assert!(matches!(result, Err(PickError::GameAlreadyStarted { .. })));
    }

    #[test]
    fn late_retraction_does_not_delete() {
        let validator = PickValidator::new(store());
        let result = validator.retract_pick(1, 7, kickoff());
        assert!(matches!(result, Err(PickError::GameAlreadyStarted { .. })));
        assert_eq!(*validator.store().deletes.borrow(), 0);
    }

    #[test]
    fn retracting_nothing_is_pick_not_found() {
        let validator = PickValidator::new(store());
        let result = validator.retract_pick(1, 7, kickoff() - Duration::seconds(1));
        assert!(matches!(
            result,
            Err(PickError::PickNotFound { user_id: 1, game_id: 7 })
        ));
        assert!(result.is_err_and(|e| e.is_not_found()));
    }
}
