//! crates/study_planner_core/src/domain.rs
//!
//! Defines the pure, core data structures for the study planner.
//! These structs are independent of any database or serialization format.

use crate::calendar::session_end;
use crate::error::PlannerError;
use chrono::{DateTime, NaiveTime, Utc, Weekday};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Subject Attributes
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(PlannerError::InvalidValue {
                field: "difficulty",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(PlannerError::InvalidValue {
                field: "priority",
                value: other.to_string(),
            }),
        }
    }
}

/// Identifies a plan week with the planner's own week-numbering scheme
/// (see [`crate::calendar::week_key`]), not ISO-8601.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
    pub week_number: u32,
    pub year: i32,
}

//=========================================================================================
// Subject
//=========================================================================================

/// One entry in a subject's skip history, appended when a session is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipRecord {
    pub scheduled_time: DateTime<Utc>,
    pub day_of_week: Weekday,
    /// The week the skipped session was scheduled in.
    pub week: WeekKey,
    /// When the skip was detected. Drives the weekly counter reset.
    pub recorded_at: DateTime<Utc>,
}

/// A subject the user studies, with the history metrics the scoring engine reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub difficulty: Difficulty,
    pub priority: Priority,
    pub last_studied: DateTime<Utc>,
    pub total_hours: f64,
    pub skips_this_week: u32,
    pub skip_history: Vec<SkipRecord>,
    pub created_at: DateTime<Utc>,
}

impl Subject {
    /// Creates a fresh subject: never skipped, no hours, "studied" as of `now`.
    pub fn new(
        user_id: Uuid,
        name: &str,
        difficulty: Difficulty,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<Self, PlannerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlannerError::MissingName("subject"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            difficulty,
            priority,
            last_studied: now,
            total_hours: 0.0,
            skips_this_week: 0,
            skip_history: Vec::new(),
            created_at: now,
        })
    }
}

/// The user-editable fields of a subject. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SubjectUpdate {
    pub name: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub priority: Option<Priority>,
}

impl SubjectUpdate {
    pub fn apply(self, subject: &mut Subject) -> Result<(), PlannerError> {
        if let Some(name) = self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(PlannerError::MissingName("subject"));
            }
            subject.name = name.to_string();
        }
        if let Some(difficulty) = self.difficulty {
            subject.difficulty = difficulty;
        }
        if let Some(priority) = self.priority {
            subject.priority = priority;
        }
        Ok(())
    }
}

//=========================================================================================
// Sessions and Plans
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Scheduled,
    Active,
    Completed,
    Skipped,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Skipped => "skipped",
        }
    }

    /// `completed` and `skipped` have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Skipped)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(SessionStatus::Scheduled),
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "skipped" => Ok(SessionStatus::Skipped),
            other => Err(PlannerError::InvalidValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// A time-boxed session that has not been given an identity yet.
/// Produced by the schedule generator, manual adds and template loads.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDraft {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub allocated: f64,
}

/// A scheduled study block inside a [`Plan`].
///
/// `subject_name` is a snapshot taken when the session was created; renaming
/// the subject later does not touch it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub allocated: f64,
    pub completed: bool,
    pub status: SessionStatus,
}

impl Session {
    pub fn from_draft(draft: SessionDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_id: draft.subject_id,
            subject_name: draft.subject_name,
            scheduled_start: draft.scheduled_start,
            scheduled_end: draft.scheduled_end,
            actual_start: None,
            actual_end: None,
            allocated: draft.allocated,
            completed: false,
            status: SessionStatus::Scheduled,
        }
    }

    /// Changes the allocation and moves `scheduled_end` so the two stay consistent.
    /// A rejected duration leaves the session untouched.
    pub fn set_duration(&mut self, duration: f64) -> Result<(), PlannerError> {
        self.scheduled_end = session_end(self.scheduled_start, duration)?;
        self.allocated = duration;
        Ok(())
    }
}

/// One user's sessions for one week. `(user_id, week)` is the natural key.
///
/// Sessions keep insertion order; sort by `scheduled_start` for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week: WeekKey,
    pub sessions: Vec<Session>,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn new(user_id: Uuid, week: WeekKey, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            week,
            sessions: Vec::new(),
            created_at: now,
        }
    }

    pub fn push_drafts(&mut self, drafts: impl IntoIterator<Item = SessionDraft>) {
        self.sessions
            .extend(drafts.into_iter().map(Session::from_draft));
    }

    pub fn session_mut(&mut self, session_id: Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == session_id)
    }

    pub fn remove_session(&mut self, session_id: Uuid) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.id == session_id)?;
        Some(self.sessions.remove(index))
    }

    /// The sessions ordered by start time, for display.
    pub fn sessions_by_start(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.iter().collect();
        sessions.sort_by_key(|s| s.scheduled_start);
        sessions
    }
}

//=========================================================================================
// Templates
//=========================================================================================

/// A session pattern anchored to a weekday and wall-clock time, not a date.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSession {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub duration: f64,
}

/// A reusable week pattern. Independent of any plan's lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub sessions: Vec<TemplateSession>,
    pub total_hours_per_week: f64,
    pub created_at: DateTime<Utc>,
}
