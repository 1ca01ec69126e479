//! services/api/src/web/chat.rs
//!
//! Question answering over a subject's notes.

use crate::web::response::{
    bad_request, json_body, non_empty, port_failure, ErrorBody, HandlerError,
};
use crate::web::state::AppState;
use askmynotes_core::domain::{ChatInput, ChatRole, ChatTurn, ModelReply};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct ChatTurnPayload {
    pub role: TurnRole,
    pub content: String,
}

impl From<ChatTurnPayload> for ChatTurn {
    fn from(turn: ChatTurnPayload) -> Self {
        ChatTurn {
            role: match turn.role {
                TurnRole::User => ChatRole::User,
                TurnRole::Assistant => ChatRole::Assistant,
            },
            content: turn.content,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct ChatRequest {
    pub subject_name: Option<String>,
    pub question: Option<String>,
    /// Used only when no stored subject matches `subject_name`.
    pub extracted_text: Option<String>,
    pub history: Option<Vec<ChatTurnPayload>>,
}

/// The shape the prompt asks the model for. The handler returns the model's
/// JSON unchanged, so extra, missing or oddly typed fields reach the client.
#[derive(Serialize, ToSchema, Debug)]
pub struct ChatAnswerResponse {
    pub answer: String,
    pub citations: Vec<String>,
    pub confidence: f64,
    pub evidence_snippets: Vec<String>,
}

/// Ask a question about a subject's notes.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The model's answer", body = ChatAnswerResponse),
        (status = 400, description = "Missing fields or no material for the subject", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ModelReply>, HandlerError> {
    let req = json_body(payload).map_err(bad_request)?;
    let (Some(subject_name), Some(question)) = (non_empty(req.subject_name), non_empty(req.question))
    else {
        return Err(bad_request("Missing required fields: subject_name or question"));
    };

    // The stored subject always wins so that every upload is included.
    let stored = state
        .chats
        .get_chat_by_subject(&subject_name)
        .await
        .map_err(|e| port_failure(e, "Failed to process chat message"))?;
    let extracted_text = match stored {
        Some(session) => non_empty(Some(session.extracted_text)),
        None => non_empty(req.extracted_text),
    }
    .ok_or_else(|| bad_request(format!("No study material found for subject: {}", subject_name)))?;

    let input = ChatInput {
        subject_name,
        extracted_text,
        question,
        history: req
            .history
            .unwrap_or_default()
            .into_iter()
            .map(ChatTurn::from)
            .collect(),
    };
    let answer = state
        .assistant
        .chat_with_material(&input)
        .await
        .map_err(|e| port_failure(e, "Failed to process chat message"))?;

    Ok(Json(answer))
}
