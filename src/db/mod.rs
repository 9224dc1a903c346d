//! SQLite persistence for teams, users, games and picks.

mod error;
mod models;
mod repository;
mod schema;

pub use error::{DbError, DbErrorKind};
pub use models::{
    Game, GameStatus, GradedPick, NewGame, NewPick, NewTeam, NewUser, Pick, PickDetail,
    PickFilter, Team, User,
};
pub use repository::{PickemRepository, Transaction};
