//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API
//! server. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_planner_core::calendar::{format_start_time, weekday_name};
use study_planner_core::progress::WeeklyProgress;
use study_planner_core::{
    AdaptiveRecommendation, Plan, Recommendation, Session, Subject, Template, TemplateSession,
    WeekKey,
};
use utoipa::ToSchema;
use uuid::Uuid;

fn default_level() -> String {
    "medium".to_string()
}

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectRequest {
    #[serde(default)]
    pub name: String,
    /// One of `easy`, `medium`, `hard`. Defaults to `medium`.
    #[serde(default = "default_level")]
    pub difficulty: String,
    /// One of `low`, `medium`, `high`. Defaults to `medium`.
    #[serde(default = "default_level")]
    pub priority: String,
}

/// Absent fields are left unchanged.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubjectRequest {
    pub name: Option<String>,
    pub difficulty: Option<String>,
    pub priority: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanRequest {
    /// Study hours per selected day.
    pub hours: f64,
    /// Wall-clock "HH:MM" at which each day starts.
    pub start_time: String,
    /// Weekday names, e.g. `["Monday", "Wednesday"]`.
    pub days_of_week: Vec<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddSessionRequest {
    pub subject_id: Uuid,
    pub day: String,
    pub time: String,
    pub duration: f64,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDurationRequest {
    pub duration: f64,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveTemplateRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResponse {
    pub id: Uuid,
    pub name: String,
    pub difficulty: String,
    pub priority: String,
    pub last_studied: DateTime<Utc>,
    pub total_hours: f64,
    pub skips_this_week: u32,
    pub created_at: DateTime<Utc>,
}

impl From<Subject> for SubjectResponse {
    fn from(subject: Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name,
            difficulty: subject.difficulty.as_str().to_string(),
            priority: subject.priority.as_str().to_string(),
            last_studied: subject.last_studied,
            total_hours: subject.total_hours,
            skips_this_week: subject.skips_this_week,
            created_at: subject.created_at,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    #[serde(flatten)]
    pub subject: SubjectResponse,
    pub recommendation_score: f64,
    pub days_since_studied: i64,
}

impl From<Recommendation> for RecommendationResponse {
    fn from(rec: Recommendation) -> Self {
        Self {
            subject: rec.subject.into(),
            recommendation_score: rec.score,
            days_since_studied: rec.days_since_studied,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveRecommendationResponse {
    #[serde(flatten)]
    pub subject: SubjectResponse,
    pub adaptive_score: f64,
    /// Completed over planned sessions this week, as a rounded percent.
    pub completion_rate: u32,
    pub planned_this_week: usize,
    pub completed_this_week: usize,
    pub skipped_today: usize,
    pub completed_today: usize,
}

impl From<AdaptiveRecommendation> for AdaptiveRecommendationResponse {
    fn from(rec: AdaptiveRecommendation) -> Self {
        let activity = rec.activity;
        Self {
            subject: rec.subject.into(),
            adaptive_score: rec.score,
            completion_rate: (activity.completion_rate() * 100.0).round() as u32,
            planned_this_week: activity.planned,
            completed_this_week: activity.completed,
            skipped_today: activity.skipped_today,
            completed_today: activity.completed_today,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub allocated: f64,
    pub completed: bool,
    /// One of `scheduled`, `active`, `completed`, `skipped`.
    pub status: String,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            subject_id: session.subject_id,
            subject_name: session.subject_name,
            scheduled_start: session.scheduled_start,
            scheduled_end: session.scheduled_end,
            actual_start: session.actual_start,
            actual_end: session.actual_end,
            allocated: session.allocated,
            completed: session.completed,
            status: session.status.as_str().to_string(),
        }
    }
}

/// A week's plan. `id` and `createdAt` are absent when the week has no plan yet.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub id: Option<Uuid>,
    pub week_number: u32,
    pub year: i32,
    pub sessions: Vec<SessionResponse>,
    pub created_at: Option<DateTime<Utc>>,
}

impl PlanResponse {
    pub fn empty(week: WeekKey) -> Self {
        Self {
            id: None,
            week_number: week.week_number,
            year: week.year,
            sessions: Vec::new(),
            created_at: None,
        }
    }
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            id: Some(plan.id),
            week_number: plan.week.week_number,
            year: plan.week.year,
            sessions: plan.sessions.into_iter().map(Into::into).collect(),
            created_at: Some(plan.created_at),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DurationUpdatedResponse {
    pub message: String,
    pub session: SessionResponse,
    pub new_duration: f64,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearWeekResponse {
    pub message: String,
    pub deleted: usize,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgressResponse {
    pub total: usize,
    pub completed: usize,
    pub percentage: u32,
    pub sessions: Vec<SessionResponse>,
}

impl From<WeeklyProgress> for WeeklyProgressResponse {
    fn from(progress: WeeklyProgress) -> Self {
        Self {
            total: progress.total,
            completed: progress.completed,
            percentage: progress.percentage,
            sessions: progress.sessions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreakResponse {
    pub streak: u32,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSessionResponse {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub day_of_week: String,
    /// Wall-clock "HH:MM".
    pub start_time: String,
    pub duration: f64,
}

impl From<TemplateSession> for TemplateSessionResponse {
    fn from(session: TemplateSession) -> Self {
        Self {
            subject_id: session.subject_id,
            subject_name: session.subject_name,
            day_of_week: weekday_name(session.day_of_week).to_string(),
            start_time: format_start_time(session.start_time),
            duration: session.duration,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub sessions: Vec<TemplateSessionResponse>,
    pub total_hours_per_week: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Template> for TemplateResponse {
    fn from(template: Template) -> Self {
        Self {
            id: template.id,
            name: template.name,
            description: template.description,
            sessions: template.sessions.into_iter().map(Into::into).collect(),
            total_hours_per_week: template.total_hours_per_week,
            created_at: template.created_at,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateLoadedResponse {
    pub message: String,
    pub plan: PlanResponse,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
}
