//! services/api/src/web/subjects.rs
//!
//! Handlers for the subject registry and the "what to study next" rankings.

use crate::error::reject;
use crate::web::protocol::{
    AdaptiveRecommendationResponse, CreateSubjectRequest, MessageResponse,
    RecommendationResponse, SubjectResponse, UpdateSubjectRequest,
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
use study_planner_core::{Difficulty, Priority, SubjectUpdate};
use uuid::Uuid;

/// List the user's subjects in creation order.
#[utoipa::path(
    get,
    path = "/api/subjects",
    responses(
        (status = 200, description = "The user's subjects", body = [SubjectResponse]),
        (status = 401, description = "Missing x-user-id header")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "subjects"
)]
pub async fn list_subjects_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<SubjectResponse>>, (StatusCode, String)> {
    let subjects = state.planner.list_subjects(user_id).await.map_err(reject)?;
    Ok(Json(subjects.into_iter().map(Into::into).collect()))
}

/// Create a subject.
#[utoipa::path(
    post,
    path = "/api/subjects",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created", body = SubjectResponse),
        (status = 400, description = "Missing name or unknown difficulty/priority")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "subjects"
)]
pub async fn create_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let difficulty = req.difficulty.parse::<Difficulty>().map_err(reject)?;
    let priority = req.priority.parse::<Priority>().map_err(reject)?;
    let now = state.now().with_timezone(&Utc);
    let subject = state
        .planner
        .create_subject(user_id, &req.name, difficulty, priority, now)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(SubjectResponse::from(subject))))
}

/// Update a subject's name, difficulty or priority.
#[utoipa::path(
    put,
    path = "/api/subjects/{id}",
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = SubjectResponse),
        (status = 400, description = "Invalid field value"),
        (status = 404, description = "Subject not found")
    ),
    params(
        ("id" = Uuid, Path, description = "The subject ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    tag = "subjects"
)]
pub async fn update_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(subject_id): Path<Uuid>,
    Json(req): Json<UpdateSubjectRequest>,
) -> Result<Json<SubjectResponse>, (StatusCode, String)> {
    let update = SubjectUpdate {
        name: req.name,
        difficulty: req
            .difficulty
            .map(|d| d.parse::<Difficulty>())
            .transpose()
            .map_err(reject)?,
        priority: req
            .priority
            .map(|p| p.parse::<Priority>())
            .transpose()
            .map_err(reject)?,
    };
    let subject = state
        .planner
        .update_subject(user_id, subject_id, update)
        .await
        .map_err(reject)?;
    Ok(Json(subject.into()))
}

/// Delete a subject. Sessions already planned for it are kept.
#[utoipa::path(
    delete,
    path = "/api/subjects/{id}",
    responses(
        (status = 200, description = "Subject deleted", body = MessageResponse),
        (status = 404, description = "Subject not found")
    ),
    params(
        ("id" = Uuid, Path, description = "The subject ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    tag = "subjects"
)]
pub async fn delete_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    state
        .planner
        .delete_subject(user_id, subject_id)
        .await
        .map_err(reject)?;
    Ok(Json(MessageResponse::new("Subject deleted")))
}

/// Rank subjects by study history alone.
#[utoipa::path(
    get,
    path = "/api/subjects/recommendations",
    responses(
        (status = 200, description = "Subjects, highest score first", body = [RecommendationResponse])
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "subjects"
)]
pub async fn recommendations_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<RecommendationResponse>>, (StatusCode, String)> {
    let ranked = state
        .planner
        .recommendations(user_id, &state.now())
        .await
        .map_err(reject)?;
    Ok(Json(ranked.into_iter().map(Into::into).collect()))
}

/// Rank subjects by history plus this week's completions and skips.
#[utoipa::path(
    get,
    path = "/api/subjects/recommendations/adaptive",
    responses(
        (status = 200, description = "Subjects, highest score first", body = [AdaptiveRecommendationResponse])
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "subjects"
)]
pub async fn adaptive_recommendations_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<AdaptiveRecommendationResponse>>, (StatusCode, String)> {
    let ranked = state
        .planner
        .adaptive_recommendations(user_id, &state.now())
        .await
        .map_err(reject)?;
    Ok(Json(ranked.into_iter().map(Into::into).collect()))
}
