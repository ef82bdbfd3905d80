pub mod middleware;
pub mod plans;
pub mod progress;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod subjects;
pub mod templates;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::require_user;
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the complete application router: the `/api` routes plus Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    // Routes scoped to the caller's identity.
    let user_routes = Router::new()
        .route(
            "/subjects",
            get(subjects::list_subjects_handler).post(subjects::create_subject_handler),
        )
        .route(
            "/subjects/recommendations",
            get(subjects::recommendations_handler),
        )
        .route(
            "/subjects/recommendations/adaptive",
            get(subjects::adaptive_recommendations_handler),
        )
        .route(
            "/subjects/{id}",
            put(subjects::update_subject_handler).delete(subjects::delete_subject_handler),
        )
        .route(
            "/plans/current",
            get(plans::current_plan_handler).delete(plans::clear_week_handler),
        )
        .route("/plans/generate", post(plans::generate_plan_handler))
        .route("/plans/session", post(plans::add_session_handler))
        .route(
            "/plans/complete/{session_id}",
            post(plans::complete_session_handler),
        )
        .route(
            "/plans/session/{session_id}/duration",
            put(plans::update_duration_handler),
        )
        .route(
            "/plans/session/{session_id}",
            delete(plans::delete_session_handler),
        )
        .route("/progress/weekly", get(progress::weekly_progress_handler))
        .route("/progress/streak", get(progress::streak_handler))
        .route("/templates", get(templates::list_templates_handler))
        .route("/templates/save", post(templates::save_template_handler))
        .route(
            "/templates/{id}/load",
            post(templates::load_template_handler),
        )
        .route("/templates/{id}", delete(templates::delete_template_handler))
        .route_layer(axum_middleware::from_fn(require_user));

    let api = Router::new()
        .route("/health", get(rest::health_handler))
        .merge(user_routes);

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
