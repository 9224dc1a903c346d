//! Deadline-gated pick submission.
//!
//! A pick can be created, changed or retracted only while its game's
//! scheduled start is strictly in the future. The caller supplies `now`, so
//! the kickoff boundary is testable without a clock.

mod error;
mod store;
mod validator;

pub use error::PickError;
pub use store::PickStore;
pub use validator::{PickValidator, PickWindowOpen, TeamInGame};
