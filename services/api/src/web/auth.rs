//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and the current-user lookup.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use askmynotes_core::domain::User;
use askmynotes_core::ports::PortError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::AuthUser;
use crate::web::response::{
    auth_fail, internal_auth_error, json_body, non_empty, AuthError, AuthMessage,
};
use crate::web::state::AppState;

pub const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema, Default)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

#[derive(Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserProfile,
}

//=========================================================================================
// Password Helpers
//=========================================================================================

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Runs an Argon2 call on the blocking pool; hashing is CPU-bound.
async fn run_argon2<T, F>(task: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, argon2::password_hash::Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| {
            error!("Password hashing task failed: {:?}", e);
            internal_auth_error()
        })?
        .map_err(|e| {
            error!("Password hashing failed: {:?}", e);
            internal_auth_error()
        })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing fields or password too short", body = AuthMessage),
        (status = 409, description = "Email already in use", body = AuthMessage),
        (status = 500, description = "Internal server error", body = AuthMessage)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let req = json_body(payload).map_err(|msg| auth_fail(StatusCode::BAD_REQUEST, msg))?;
    let (Some(name), Some(email), Some(password)) = (
        non_empty(req.name),
        non_empty(req.email),
        non_empty(req.password),
    ) else {
        return Err(auth_fail(StatusCode::BAD_REQUEST, "All fields are required."));
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(auth_fail(
            StatusCode::BAD_REQUEST,
            "Password must be at least 6 characters.",
        ));
    }

    // 1. Hash the password
    let password_hash = run_argon2(move || hash_password(&password)).await?;

    // 2. Create the user; the store rejects duplicate emails
    let user = state
        .users
        .create_user(&name, &email, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => auth_fail(StatusCode::CONFLICT, "Email already in use."),
            other => {
                error!("Signup error: {:?}", other);
                internal_auth_error()
            }
        })?;

    // 3. Issue a token
    let token = state.tokens.issue(user.id).map_err(|e| {
        error!("Failed to issue token: {:?}", e);
        internal_auth_error()
    })?;
    info!(user_id = %user.id, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Account created successfully.".to_string(),
            token,
            user: UserSummary::from(&user),
        }),
    ))
}

/// POST /api/auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing fields", body = AuthMessage),
        (status = 401, description = "Invalid credentials", body = AuthMessage),
        (status = 500, description = "Internal server error", body = AuthMessage)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let req = json_body(payload).map_err(|msg| auth_fail(StatusCode::BAD_REQUEST, msg))?;
    let (Some(email), Some(password)) = (non_empty(req.email), non_empty(req.password)) else {
        return Err(auth_fail(
            StatusCode::BAD_REQUEST,
            "Email and password are required.",
        ));
    };

    // 1. Get user by email
    let creds = state
        .users
        .get_user_by_email(&email)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => auth_fail(StatusCode::UNAUTHORIZED, "Invalid credentials."),
            other => {
                error!("Login error: {:?}", other);
                internal_auth_error()
            }
        })?;

    // 2. Verify password
    let stored_hash = creds.password_hash.clone();
    let valid = run_argon2(move || verify_password(&password, &stored_hash)).await?;
    if !valid {
        return Err(auth_fail(StatusCode::UNAUTHORIZED, "Invalid credentials."));
    }

    // 3. Issue a token
    let token = state.tokens.issue(creds.user.id).map_err(|e| {
        error!("Failed to issue token: {:?}", e);
        internal_auth_error()
    })?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Logged in successfully.".to_string(),
        token,
        user: UserSummary::from(&creds.user),
    }))
}

/// GET /api/auth/me - The currently authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = AuthMessage),
        (status = 404, description = "User not found", body = AuthMessage),
        (status = 500, description = "Internal server error", body = AuthMessage)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<MeResponse>, AuthError> {
    let user = state
        .users
        .get_user_by_id(user_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => auth_fail(StatusCode::NOT_FOUND, "User not found."),
            other => {
                error!("GetMe error: {:?}", other);
                internal_auth_error()
            }
        })?;

    Ok(Json(MeResponse {
        success: true,
        user: UserProfile {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[tokio::test]
    async fn argon2_runs_on_the_blocking_pool() {
        let hash = run_argon2(|| hash_password("hunter22")).await.unwrap();
        assert!(run_argon2(move || verify_password("hunter22", &hash)).await.unwrap());

        let (status, body) = run_argon2(|| verify_password("x", "not-a-phc-string"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.success);
    }
}
