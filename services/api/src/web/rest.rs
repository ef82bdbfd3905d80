//! services/api/src/web/rest.rs
//!
//! Contains the health endpoint and the master definition for the OpenAPI
//! specification.

use crate::web::protocol::{
    AddSessionRequest, AdaptiveRecommendationResponse, ClearWeekResponse, CreateSubjectRequest,
    DurationUpdatedResponse, GeneratePlanRequest, HealthResponse, MessageResponse, PlanResponse,
    RecommendationResponse, SaveTemplateRequest, SessionResponse, StreakResponse,
    SubjectResponse, TemplateLoadedResponse, TemplateResponse, TemplateSessionResponse,
    UpdateDurationRequest, UpdateSubjectRequest, WeeklyProgressResponse,
};
use crate::web::{plans, progress, subjects, templates};
use axum::response::Json;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        subjects::list_subjects_handler,
        subjects::create_subject_handler,
        subjects::update_subject_handler,
        subjects::delete_subject_handler,
        subjects::recommendations_handler,
        subjects::adaptive_recommendations_handler,
        plans::current_plan_handler,
        plans::generate_plan_handler,
        plans::add_session_handler,
        plans::complete_session_handler,
        plans::update_duration_handler,
        plans::delete_session_handler,
        plans::clear_week_handler,
        progress::weekly_progress_handler,
        progress::streak_handler,
        templates::list_templates_handler,
        templates::save_template_handler,
        templates::load_template_handler,
        templates::delete_template_handler,
    ),
    components(
        schemas(
            CreateSubjectRequest, UpdateSubjectRequest, GeneratePlanRequest, AddSessionRequest,
            UpdateDurationRequest, SaveTemplateRequest, SubjectResponse, RecommendationResponse,
            AdaptiveRecommendationResponse, SessionResponse, PlanResponse,
            DurationUpdatedResponse, ClearWeekResponse, MessageResponse, WeeklyProgressResponse,
            StreakResponse, TemplateSessionResponse, TemplateResponse, TemplateLoadedResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "subjects", description = "The subject registry and study recommendations."),
        (name = "plans", description = "The current week's plan and its sessions."),
        (name = "progress", description = "Completion metrics."),
        (name = "templates", description = "Reusable week patterns."),
        (name = "Study Planner API", description = "Service health.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe. Needs no user header.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Study Planner API"
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
