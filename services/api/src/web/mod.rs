pub mod auth;
pub mod chat;
pub mod middleware;
pub mod response;
pub mod rest;
pub mod state;
pub mod study;
pub mod token;
pub mod upload;

pub use middleware::require_auth;
pub use rest::{delete_session_handler, get_session_handler, list_sessions_handler};

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::state::AppState;

/// Largest accepted request body (uploads included).
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            warn!("Ignoring invalid CORS_ORIGIN '{}': {}", origin, e);
            layer
        }
    }
}

/// Builds the complete HTTP application around a prepared `AppState`.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/auth/signup", post(auth::signup_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/upload", post(upload::upload_handler))
        .route("/api/chat", post(chat::chat_handler))
        .route("/api/study/practice", post(study::practice_handler))
        .route("/api/chat/sessions", get(list_sessions_handler))
        .route(
            "/api/chat/sessions/{id}",
            get(get_session_handler).delete(delete_session_handler),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .route("/", get(|| async { "AskMyNotes backend running" }))
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(&app_state.config.cors_origin))
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", rest::ApiDoc::openapi()))
}
