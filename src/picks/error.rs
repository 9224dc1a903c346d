//! Pick validation errors.

use crate::db::DbError;

/// Why a pick operation was refused.
///
/// Every variant is recoverable; the display strings are stable and shown to
/// clients as-is.
#[derive(Debug, Clone, derive_more::Display)]
pub enum PickError {
    /// No game with the requested id.
    #[display("Game not found")]
    GameNotFound {
        /// Requested game.
        game_id: i32,
    },

    /// The user has no pick on the game.
    #[display("Pick not found")]
    PickNotFound {
        /// Requesting user.
        user_id: i32,
        /// Requested game.
        game_id: i32,
    },

    /// Kickoff has been reached; picks on the game are locked.
    #[display("Game has already started")]
    GameAlreadyStarted {
        /// Locked game.
        game_id: i32,
    },

    /// The chosen team is neither the home nor the away side.
    #[display("Selected team is not playing in this game")]
    InvalidTeamSelection {
        /// Game picked on.
        game_id: i32,
        /// Team that was chosen.
        team_id: i32,
    },

    /// Storage failed; passed through unchanged.
    #[display("{}", _0)]
    Storage(DbError),
}

impl PickError {
    /// True for the two not-found outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GameNotFound { .. } | Self::PickNotFound { .. })
    }
}

impl std::error::Error for PickError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for PickError {
    fn from(err: DbError) -> Self {
        Self::Storage(err)
    }
}
