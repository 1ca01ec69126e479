//! services/api/src/web/study.rs
//!
//! Practice question generation.

use crate::web::response::{
    bad_request, json_body, non_empty, port_failure, ErrorBody, HandlerError,
};
use crate::web::state::AppState;
use askmynotes_core::domain::{ModelReply, PracticeInput};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct PracticeRequest {
    pub subject_name: Option<String>,
    pub topic: Option<String>,
    pub extracted_text: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct McqResponse {
    pub question: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
    pub explanation: String,
    pub citation: String,
    pub confidence: f64,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ShortAnswerResponse {
    pub question: String,
    pub model_answer: String,
    pub explanation: String,
    pub citation: String,
    pub confidence: f64,
}

/// The shape the prompt asks the model for. The handler returns the model's
/// JSON unchanged.
#[derive(Serialize, ToSchema, Debug)]
pub struct PracticeResponse {
    pub mcqs: Vec<McqResponse>,
    pub short_answers: Vec<ShortAnswerResponse>,
}

/// Generate multiple-choice and short-answer practice questions.
#[utoipa::path(
    post,
    path = "/api/study/practice",
    request_body = PracticeRequest,
    responses(
        (status = 200, description = "Generated practice questions", body = PracticeResponse),
        (status = 400, description = "Missing subject_name or extracted_text", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn practice_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PracticeRequest>, JsonRejection>,
) -> Result<Json<ModelReply>, HandlerError> {
    let req = json_body(payload).map_err(bad_request)?;
    let (Some(subject_name), Some(extracted_text)) =
        (non_empty(req.subject_name), non_empty(req.extracted_text))
    else {
        return Err(bad_request("Missing subject_name or extracted_text"));
    };

    let input = PracticeInput {
        subject_name,
        topic: non_empty(req.topic),
        extracted_text,
    };
    let practice = state
        .assistant
        .generate_practice(&input)
        .await
        .map_err(|e| port_failure(e, "Failed to generate questions"))?;

    Ok(Json(practice))
}
