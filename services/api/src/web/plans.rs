//! services/api/src/web/plans.rs
//!
//! Handlers for the current week's plan and its sessions.

use crate::error::reject;
use crate::web::protocol::{
    AddSessionRequest, ClearWeekResponse, DurationUpdatedResponse, GeneratePlanRequest,
    MessageResponse, PlanResponse, SessionResponse, UpdateDurationRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use std::sync::Arc;
use study_planner_core::calendar::{current_week, parse_start_time, parse_weekday};
use study_planner_core::ScheduleRequest;
use uuid::Uuid;

/// Fetch the current week's plan with up-to-date session states.
#[utoipa::path(
    get,
    path = "/api/plans/current",
    responses(
        (status = 200, description = "The current plan; no sessions when none exists", body = PlanResponse)
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "plans"
)]
pub async fn current_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<PlanResponse>, (StatusCode, String)> {
    let now = state.now();
    let plan = state
        .planner
        .current_plan(user_id, &now)
        .await
        .map_err(reject)?;
    Ok(Json(match plan {
        Some(plan) => plan.into(),
        None => PlanResponse::empty(current_week(&now)),
    }))
}

/// Generate the current week's plan from the user's subjects.
#[utoipa::path(
    post,
    path = "/api/plans/generate",
    request_body = GeneratePlanRequest,
    responses(
        (status = 201, description = "Plan generated", body = PlanResponse),
        (status = 400, description = "No subjects, unknown weekday or malformed start time"),
        (status = 409, description = "A plan already exists for this week")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "plans"
)]
pub async fn generate_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GeneratePlanRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let request = ScheduleRequest::parse(req.hours, &req.start_time, &req.days_of_week)
        .map_err(reject)?;
    let plan = state
        .planner
        .generate_plan(user_id, &request, &state.now())
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(PlanResponse::from(plan))))
}

/// Place a single session by hand.
#[utoipa::path(
    post,
    path = "/api/plans/session",
    request_body = AddSessionRequest,
    responses(
        (status = 201, description = "Session added; returns the whole plan", body = PlanResponse),
        (status = 400, description = "Unknown weekday, malformed time or non-positive duration"),
        (status = 404, description = "Subject not found")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "plans"
)]
pub async fn add_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<AddSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let day = parse_weekday(&req.day).map_err(reject)?;
    let start_time = parse_start_time(&req.time).map_err(reject)?;
    let plan = state
        .planner
        .add_session(user_id, req.subject_id, day, start_time, req.duration, &state.now())
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(PlanResponse::from(plan))))
}

/// Mark a session completed and credit its hours to the subject.
#[utoipa::path(
    post,
    path = "/api/plans/complete/{session_id}",
    responses(
        (status = 200, description = "Session completed", body = SessionResponse),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session already completed or skipped")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The session ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    tag = "plans"
)]
pub async fn complete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let now = state.now().with_timezone(&Utc);
    let session = state
        .planner
        .complete_session(user_id, session_id, now)
        .await
        .map_err(reject)?;
    Ok(Json(session.into()))
}

/// Change a session's length. The end time moves with it.
#[utoipa::path(
    put,
    path = "/api/plans/session/{session_id}/duration",
    request_body = UpdateDurationRequest,
    responses(
        (status = 200, description = "Duration updated", body = DurationUpdatedResponse),
        (status = 400, description = "Non-positive duration"),
        (status = 404, description = "Session not found")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The session ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    tag = "plans"
)]
pub async fn update_duration_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UpdateDurationRequest>,
) -> Result<Json<DurationUpdatedResponse>, (StatusCode, String)> {
    let session = state
        .planner
        .update_session_duration(user_id, session_id, req.duration)
        .await
        .map_err(reject)?;
    Ok(Json(DurationUpdatedResponse {
        message: "Duration updated successfully".to_string(),
        new_duration: session.allocated,
        session: session.into(),
    }))
}

/// Remove a session from its plan.
#[utoipa::path(
    delete,
    path = "/api/plans/session/{session_id}",
    responses(
        (status = 200, description = "Session deleted", body = MessageResponse),
        (status = 404, description = "Session not found")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The session ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    tag = "plans"
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    state
        .planner
        .delete_session(user_id, session_id)
        .await
        .map_err(reject)?;
    Ok(Json(MessageResponse::new("Session deleted successfully")))
}

/// Delete the current week's plan.
#[utoipa::path(
    delete,
    path = "/api/plans/current",
    responses(
        (status = 200, description = "Plan cleared; `deleted` is 0 when there was none", body = ClearWeekResponse)
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "plans"
)]
pub async fn clear_week_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<ClearWeekResponse>, (StatusCode, String)> {
    let deleted = state
        .planner
        .clear_current_week(user_id, &state.now())
        .await
        .map_err(reject)?;
    Ok(Json(ClearWeekResponse {
        message: "All sessions cleared successfully".to_string(),
        deleted,
    }))
}
