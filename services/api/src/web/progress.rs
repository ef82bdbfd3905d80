//! services/api/src/web/progress.rs

use crate::error::reject;
use crate::web::protocol::{StreakResponse, WeeklyProgressResponse};
use crate::web::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json, Extension};
use std::sync::Arc;
use uuid::Uuid;

/// Completed versus planned sessions in the current week.
#[utoipa::path(
    get,
    path = "/api/progress/weekly",
    responses((status = 200, description = "Weekly progress", body = WeeklyProgressResponse)),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "progress"
)]
pub async fn weekly_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<WeeklyProgressResponse>, (StatusCode, String)> {
    let progress = state
        .planner
        .weekly_progress(user_id, &state.now())
        .await
        .map_err(reject)?;
    Ok(Json(progress.into()))
}

/// Consecutive days, ending today, with at least one completed session.
#[utoipa::path(
    get,
    path = "/api/progress/streak",
    responses((status = 200, description = "Current streak in days", body = StreakResponse)),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "progress"
)]
pub async fn streak_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<StreakResponse>, (StatusCode, String)> {
    let streak = state
        .planner
        .streak(user_id, &state.now())
        .await
        .map_err(reject)?;
    Ok(Json(StreakResponse { streak }))
}
