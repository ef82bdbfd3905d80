//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use study_planner_core::StudyPlanner;

/// The source of "now" for every request.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<StudyPlanner>,
    pub config: Arc<Config>,
    clock: Clock,
}

impl AppState {
    pub fn new(planner: Arc<StudyPlanner>, config: Arc<Config>) -> Self {
        Self {
            planner,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the system clock, e.g. to pin time in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The current instant on the users' wall clock.
    pub fn now(&self) -> DateTime<FixedOffset> {
        (self.clock)().with_timezone(&self.config.utc_offset)
    }
}
