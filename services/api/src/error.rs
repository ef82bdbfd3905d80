//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service and the mapping from
//! planner failures onto HTTP responses.

use crate::config::ConfigError;
use axum::http::StatusCode;
use study_planner_core::{ErrorKind, PlannerError};
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Turns a planner failure into the status and message a handler returns.
///
/// Domain failures keep their descriptive message. Storage failures are
/// logged and reported generically.
pub fn reject(err: PlannerError) -> (StatusCode, String) {
    let status = match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unexpected => {
            error!("Planner request failed: {:?}", err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong while talking to storage".to_string(),
            );
        }
    };
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_planner_core::PortError;
    use uuid::Uuid;

    #[test]
    fn test_reject_maps_taxonomy_to_status() {
        assert_eq!(reject(PlannerError::NoSubjects).0, StatusCode::BAD_REQUEST);
        assert_eq!(
            reject(PlannerError::PlanExists { week: 1, year: 2025 }).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            reject(PlannerError::SessionNotFound(Uuid::nil())).0,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_reject_hides_storage_details() {
        let (status, message) = reject(PortError::Unexpected("password=hunter2".into()).into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("hunter2"));
    }
}
