//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::web::response::{auth_fail, AuthError};
use crate::web::state::AppState;

/// The id of the user a request was authenticated as.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser(pub Uuid);

/// Middleware that validates the bearer token and extracts the user id.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| auth_fail(StatusCode::UNAUTHORIZED, "Not authorized, no token."))?;

    // 2. Verify it and recover the user id
    let user_id = state.tokens.verify(token).map_err(|e| {
        warn!("Rejected bearer token: {:?}", e);
        auth_fail(StatusCode::UNAUTHORIZED, "Not authorized, token invalid.")
    })?;

    // 3. Insert the user id into request extensions
    req.extensions_mut().insert(AuthUser(user_id));

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
