//! services/api/src/web/rest.rs
//!
//! Contains the chat-session (subject) handlers, the session response payloads
//! shared with the upload handler, and the master definition for the OpenAPI
//! specification.

use crate::web::response::{bad_request, port_failure, AuthMessage, ErrorBody, HandlerError};
use crate::web::state::AppState;
use crate::web::{auth, chat, study, upload};
use askmynotes_core::domain::{ChatSession, KeyConcept, Topic};
use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::me_handler,
        upload::upload_handler,
        chat::chat_handler,
        study::practice_handler,
        list_sessions_handler,
        get_session_handler,
        delete_session_handler,
    ),
    components(
        schemas(
            auth::SignupRequest, auth::LoginRequest, auth::AuthResponse, auth::MeResponse,
            auth::UserSummary, auth::UserProfile, AuthMessage, ErrorBody,
            ChatSessionResponse, TopicResponse, KeyConceptResponse, DeleteResponse,
            chat::ChatRequest, chat::ChatTurnPayload, chat::ChatAnswerResponse,
            study::PracticeRequest, study::PracticeResponse, study::McqResponse,
            study::ShortAnswerResponse,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "AskMyNotes API", description = "Study assistant: upload notes, ask questions, practice.")
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

//=========================================================================================
// API Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema, Debug)]
pub struct TopicResponse {
    pub topic_name: String,
    pub subtopics: Vec<String>,
    pub summary: String,
    pub citations: Vec<String>,
}

impl From<Topic> for TopicResponse {
    fn from(t: Topic) -> Self {
        Self {
            topic_name: t.topic_name,
            subtopics: t.subtopics,
            summary: t.summary,
            citations: t.citations,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct KeyConceptResponse {
    pub concept: String,
    pub definition: String,
    pub citation: String,
}

impl From<KeyConcept> for KeyConceptResponse {
    fn from(k: KeyConcept) -> Self {
        Self {
            concept: k.concept,
            definition: k.definition,
            citation: k.citation,
        }
    }
}

/// A subject notebook as returned to clients.
#[derive(Serialize, ToSchema, Debug)]
pub struct ChatSessionResponse {
    pub id: Uuid,
    pub subject: String,
    pub file_name: String,
    pub description: String,
    pub extracted_text: String,
    pub topics: Vec<TopicResponse>,
    pub key_concepts: Vec<KeyConceptResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<ChatSession> for ChatSessionResponse {
    fn from(c: ChatSession) -> Self {
        Self {
            id: c.id,
            subject: c.subject,
            file_name: c.file_name,
            description: c.description,
            extracted_text: c.extracted_text,
            topics: c.topics.into_iter().map(TopicResponse::from).collect(),
            key_concepts: c
                .key_concepts
                .into_iter()
                .map(KeyConceptResponse::from)
                .collect(),
            created_at: c.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct DeleteResponse {
    pub message: String,
}

fn parse_session_id(id: &str) -> Result<Uuid, HandlerError> {
    Uuid::parse_str(id).map_err(|_| bad_request(format!("Invalid chat session id: {}", id)))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List every stored subject, newest first.
#[utoipa::path(
    get,
    path = "/api/chat/sessions",
    responses(
        (status = 200, description = "All chat sessions", body = [ChatSessionResponse]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChatSessionResponse>>, HandlerError> {
    let chats = state
        .chats
        .list_chats()
        .await
        .map_err(|e| port_failure(e, "Failed to retrieve chats"))?;
    Ok(Json(chats.into_iter().map(ChatSessionResponse::from).collect()))
}

/// Fetch a single subject by id.
#[utoipa::path(
    get,
    path = "/api/chat/sessions/{id}",
    params(("id" = Uuid, Path, description = "The chat session id.")),
    responses(
        (status = 200, description = "The chat session", body = ChatSessionResponse),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "No such chat session", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ChatSessionResponse>, HandlerError> {
    let id = parse_session_id(&id)?;
    let chat = state
        .chats
        .get_chat(id)
        .await
        .map_err(|e| port_failure(e, "Failed to retrieve chat"))?;
    Ok(Json(chat.into()))
}

/// Delete a subject. Deleting an unknown id succeeds.
#[utoipa::path(
    delete,
    path = "/api/chat/sessions/{id}",
    params(("id" = Uuid, Path, description = "The chat session id.")),
    responses(
        (status = 200, description = "Chat deleted", body = DeleteResponse),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, HandlerError> {
    let id = parse_session_id(&id)?;
    state
        .chats
        .delete_chat(id)
        .await
        .map_err(|e| port_failure(e, "Failed to delete chat"))?;
    info!(chat_id = %id, "Chat session deleted");

    Ok(Json(DeleteResponse {
        message: "Chat deleted successfully".to_string(),
    }))
}
