//! services/api/src/web/response.rs
//!
//! Error bodies shared by the handlers. Auth endpoints answer with
//! `{success, message}`; every other endpoint answers with `{error}`.

use askmynotes_core::ports::PortError;
use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// The error half of every non-auth handler.
pub type HandlerError = (StatusCode, Json<ErrorBody>);

pub fn fail(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub fn bad_request(message: impl Into<String>) -> HandlerError {
    fail(StatusCode::BAD_REQUEST, message)
}

/// Maps a port failure onto a status code. Unexpected failures keep their own
/// message, or `fallback` when they carry none.
pub fn port_failure(e: PortError, fallback: &str) -> HandlerError {
    error!("{}: {:?}", fallback, e);
    match e {
        PortError::NotFound(msg) => fail(StatusCode::NOT_FOUND, msg),
        PortError::Conflict(msg) => fail(StatusCode::CONFLICT, msg),
        PortError::Unauthorized => fail(StatusCode::UNAUTHORIZED, "Unauthorized"),
        PortError::Unexpected(msg) if msg.is_empty() => {
            fail(StatusCode::INTERNAL_SERVER_ERROR, fallback)
        }
        PortError::Unexpected(msg) => fail(StatusCode::INTERNAL_SERVER_ERROR, msg),
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct AuthMessage {
    pub success: bool,
    pub message: String,
}

/// The error half of the auth handlers and middleware.
pub type AuthError = (StatusCode, Json<AuthMessage>);

pub fn auth_fail(status: StatusCode, message: impl Into<String>) -> AuthError {
    (
        status,
        Json(AuthMessage {
            success: false,
            message: message.into(),
        }),
    )
}

pub fn internal_auth_error() -> AuthError {
    auth_fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
}

/// Unwraps a JSON request body. A request sent without a JSON content type
/// reads as an empty object, so the handler reports its fields as missing. A
/// body that fails to parse yields the rejection's message for a 400 reply.
pub fn json_body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, String> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            Err(rejection.body_text())
        }
    }
}

/// Treats absent, empty and whitespace-only form values alike.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
