//! services/api/src/web/templates.rs
//!
//! Handlers for saving a week as a reusable template and replaying it.

use crate::error::reject;
use crate::web::protocol::{
    MessageResponse, PlanResponse, SaveTemplateRequest, TemplateLoadedResponse, TemplateResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use std::sync::Arc;
use uuid::Uuid;

/// List the user's templates, newest first.
#[utoipa::path(
    get,
    path = "/api/templates",
    responses((status = 200, description = "The user's templates", body = [TemplateResponse])),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "templates"
)]
pub async fn list_templates_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<TemplateResponse>>, (StatusCode, String)> {
    let templates = state.planner.list_templates(user_id).await.map_err(reject)?;
    Ok(Json(templates.into_iter().map(Into::into).collect()))
}

/// Save the current week's plan as a template.
#[utoipa::path(
    post,
    path = "/api/templates/save",
    request_body = SaveTemplateRequest,
    responses(
        (status = 201, description = "Template saved", body = TemplateResponse),
        (status = 400, description = "Missing name or no plan this week")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    tag = "templates"
)]
pub async fn save_template_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<SaveTemplateRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let template = state
        .planner
        .save_template(user_id, &req.name, req.description.as_deref(), &state.now())
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(TemplateResponse::from(template))))
}

/// Replay a template onto the current week.
#[utoipa::path(
    post,
    path = "/api/templates/{id}/load",
    responses(
        (status = 201, description = "Template loaded", body = TemplateLoadedResponse),
        (status = 404, description = "Template not found"),
        (status = 409, description = "A plan already exists for this week")
    ),
    params(
        ("id" = Uuid, Path, description = "The template ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    tag = "templates"
)]
pub async fn load_template_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(template_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (template, plan) = state
        .planner
        .load_template(user_id, template_id, &state.now())
        .await
        .map_err(reject)?;
    Ok((
        StatusCode::CREATED,
        Json(TemplateLoadedResponse {
            message: format!("Template \"{}\" loaded successfully", template.name),
            plan: PlanResponse::from(plan),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    responses(
        (status = 200, description = "Template deleted", body = MessageResponse),
        (status = 404, description = "Template not found")
    ),
    params(
        ("id" = Uuid, Path, description = "The template ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    tag = "templates"
)]
pub async fn delete_template_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(template_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    state
        .planner
        .delete_template(user_id, template_id)
        .await
        .map_err(reject)?;
    Ok(Json(MessageResponse::new("Template deleted successfully")))
}
