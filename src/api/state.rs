//! Shared application state.

use std::sync::Arc;

use tracing::instrument;

use crate::clock::{Clock, SystemClock};
use crate::db::PickemRepository;
use crate::picks::PickValidator;

/// State handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    repository: PickemRepository,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// State over `repository` using the system clock.
    #[instrument(skip(repository))]
    pub fn new(repository: PickemRepository) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock))
    }

    /// State over `repository` using `clock` for pick deadlines.
    pub fn with_clock(repository: PickemRepository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// The repository.
    pub fn repository(&self) -> &PickemRepository {
        &self.repository
    }

    /// The clock.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// A validator over a clone of the repository.
    pub fn validator(&self) -> PickValidator<PickemRepository> {
        PickValidator::new(self.repository.clone())
    }
}
