//! crates/study_planner_core/src/error.rs
//!
//! Defines the domain error type shared by the scheduling core and the
//! planner service, along with the coarse error taxonomy callers map onto
//! their own failure surfaces (HTTP status codes, CLI exit codes, ...).

use crate::domain::SessionStatus;
use crate::ports::PortError;
use uuid::Uuid;

/// The broad category of a [`PlannerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any mutation.
    Validation,
    /// The request collides with existing state.
    Conflict,
    /// The referenced entity does not exist for this user.
    NotFound,
    /// A collaborator failed in a way the core cannot explain.
    Unexpected,
}

/// Every failure the scheduling core can report.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("No subjects available to schedule")]
    NoSubjects,

    #[error("Unknown weekday '{0}'")]
    UnknownWeekday(String),

    #[error("Invalid start time '{0}', expected HH:MM")]
    InvalidStartTime(String),

    #[error("Invalid duration {0}h: a session must last longer than zero hours")]
    InvalidDuration(f64),

    #[error("Invalid {field} '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("A {0} name is required")]
    MissingName(&'static str),

    #[error("A plan already exists for week {week} of {year}. Clear it first or add sessions manually")]
    PlanExists { week: u32, year: i32 },

    #[error("No plan with sessions exists for week {week} of {year}")]
    EmptyPlan { week: u32, year: i32 },

    #[error("Session {session} is already {status}")]
    SessionClosed { session: Uuid, status: SessionStatus },

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Subject {0} not found")]
    SubjectNotFound(Uuid),

    #[error("Template {0} not found")]
    TemplateNotFound(Uuid),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl PlannerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlannerError::NoSubjects
            | PlannerError::UnknownWeekday(_)
            | PlannerError::InvalidStartTime(_)
            | PlannerError::InvalidDuration(_)
            | PlannerError::InvalidValue { .. }
            | PlannerError::MissingName(_)
            | PlannerError::EmptyPlan { .. } => ErrorKind::Validation,
            PlannerError::PlanExists { .. } | PlannerError::SessionClosed { .. } => {
                ErrorKind::Conflict
            }
            PlannerError::SessionNotFound(_)
            | PlannerError::SubjectNotFound(_)
            | PlannerError::TemplateNotFound(_) => ErrorKind::NotFound,
            PlannerError::Port(PortError::NotFound(_)) => ErrorKind::NotFound,
            PlannerError::Port(PortError::Conflict(_)) => ErrorKind::Conflict,
            PlannerError::Port(PortError::Unexpected(_)) => ErrorKind::Unexpected,
        }
    }
}

/// A convenience type alias for `Result<T, PlannerError>`.
pub type PlannerResult<T> = Result<T, PlannerError>;
