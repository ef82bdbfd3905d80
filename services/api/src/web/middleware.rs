//! services/api/src/web/middleware.rs
//!
//! Identity middleware for the per-user routes.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::warn;
use uuid::Uuid;

/// The header carrying the caller's identity, set by the authentication layer
/// in front of this service.
pub const USER_HEADER: &str = "x-user-id";

/// Middleware that extracts the user id from the `x-user-id` header.
///
/// If valid, inserts the user id into request extensions for handlers to use.
/// A missing header is 401 Unauthorized; a malformed one is 400 Bad Request.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, (StatusCode, String)> {
    let header = req
        .headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                format!("{} header is required", USER_HEADER),
            )
        })?;

    let user_id = Uuid::parse_str(header.trim()).map_err(|_| {
        warn!("Rejected malformed user id header");
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid {} format", USER_HEADER),
        )
    })?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}
