//! crates/study_planner_core/src/ports.rs
//!
//! Defines the storage contract the planner core depends on.
//! The trait forms the boundary of the hexagonal architecture, allowing the core
//! to be independent of a specific database.

use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::{Plan, Subject, Template, WeekKey};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflicting write: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Per-user storage for subjects, plans and templates.
///
/// Every lookup is scoped by `user_id`; an entity owned by another user is
/// reported exactly like a missing one.
#[async_trait]
pub trait StudyRepository: Send + Sync {
    // --- Subjects ---
    async fn list_subjects(&self, user_id: Uuid) -> PortResult<Vec<Subject>>;

    async fn get_subject(&self, user_id: Uuid, subject_id: Uuid) -> PortResult<Subject>;

    /// Inserts or replaces the subject, including its skip history.
    async fn save_subject(&self, subject: &Subject) -> PortResult<()>;

    async fn delete_subject(&self, user_id: Uuid, subject_id: Uuid) -> PortResult<()>;

    // --- Plans ---
    async fn get_plan(&self, user_id: Uuid, week: WeekKey) -> PortResult<Option<Plan>>;

    async fn find_plan_by_session(&self, user_id: Uuid, session_id: Uuid) -> PortResult<Option<Plan>>;

    /// All plans of the user, newest first.
    async fn list_plans(&self, user_id: Uuid) -> PortResult<Vec<Plan>>;

    /// Inserts or replaces the plan and all of its sessions. Fails with
    /// `Conflict` if a different plan already holds `(user_id, week)`.
    async fn save_plan(&self, plan: &Plan) -> PortResult<()>;

    /// Writes a plan and a subject as one unit: either both land or neither does.
    async fn save_plan_and_subject(&self, plan: &Plan, subject: &Subject) -> PortResult<()>;

    /// Removes the plan with its sessions, returning what was removed.
    async fn delete_plan(&self, user_id: Uuid, week: WeekKey) -> PortResult<Option<Plan>>;

    // --- Templates ---
    /// All templates of the user, newest first.
    async fn list_templates(&self, user_id: Uuid) -> PortResult<Vec<Template>>;

    async fn get_template(&self, user_id: Uuid, template_id: Uuid) -> PortResult<Template>;

    async fn save_template(&self, template: &Template) -> PortResult<()>;

    async fn delete_template(&self, user_id: Uuid, template_id: Uuid) -> PortResult<()>;
}
