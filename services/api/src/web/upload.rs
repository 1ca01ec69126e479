//! services/api/src/web/upload.rs
//!
//! The notes upload endpoint: extracts text, asks the model for a topic and
//! concept breakdown, and stores it as a new subject or merges it into an
//! existing one.

use crate::web::response::{bad_request, non_empty, port_failure, ErrorBody, HandlerError};
use crate::web::rest::ChatSessionResponse;
use crate::web::state::AppState;
use askmynotes_core::domain::{AnalysisInput, AnalysisResult, ChatSession, NewChatSession, MAX_SUBJECTS};
use askmynotes_core::merge;
use axum::{
    extract::{Multipart, State},
    response::Json,
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

/// The multipart fields of an upload request, before validation.
#[derive(Default, Debug)]
pub struct UploadForm {
    pub subject_name: Option<String>,
    pub optional_description: Option<String>,
    pub file: Option<UploadedFile>,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, HandlerError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Failed to read multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("untitled.txt").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read file bytes: {}", e)))?;
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            "subject_name" | "optional_description" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read field {}: {}", name, e)))?;
                if name == "subject_name" {
                    form.subject_name = Some(value);
                } else {
                    form.optional_description = Some(value);
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Upload study material for a subject.
///
/// Accepts `multipart/form-data` with a `file` part, a `subject_name` field and
/// an optional `optional_description` field. At most three subjects may exist.
#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content_type = "multipart/form-data", description = "The notes file plus subject fields."),
    responses(
        (status = 200, description = "The created or updated subject", body = ChatSessionResponse),
        (status = 400, description = "Missing file or subject, or subject limit reached", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ChatSessionResponse>, HandlerError> {
    let form = read_form(multipart).await?;
    let session = ingest_upload(&state, form).await?;
    Ok(Json(session.into()))
}

/// Validates an upload and writes it to the chat store.
pub async fn ingest_upload(state: &AppState, form: UploadForm) -> Result<ChatSession, HandlerError> {
    let (Some(subject_name), Some(file)) = (non_empty(form.subject_name), form.file) else {
        return Err(bad_request("Missing required fields: subject_name or file"));
    };
    let description = non_empty(form.optional_description);

    // 1. Enforce the subject cap, which only applies to new subjects
    let existing = state
        .chats
        .get_chat_by_subject(&subject_name)
        .await
        .map_err(|e| port_failure(e, "Failed to process upload"))?;
    if existing.is_none() {
        let current = state
            .chats
            .list_chats()
            .await
            .map_err(|e| port_failure(e, "Failed to process upload"))?;
        if current.len() >= MAX_SUBJECTS {
            return Err(bad_request(
                "Maximum of 3 unique subjects allowed. Please update an existing subject or delete one.",
            ));
        }
    }

    // 2. Extract text
    let extracted_text = state
        .extractor
        .extract_text(&file.file_name, file.content_type.as_deref(), &file.data)
        .await
        .map_err(|e| port_failure(e, "Failed to process upload"))?;

    // 3. Analyse only the new content; a failed analysis degrades to an empty one
    let analysis_input = AnalysisInput {
        subject_name: subject_name.clone(),
        optional_description: description
            .clone()
            .or_else(|| existing.as_ref().map(|c| c.description.clone())),
        file_name: file.file_name.clone(),
        extracted_text: extracted_text.clone(),
    };
    let analysis = match state.assistant.analyze_material(&analysis_input).await {
        Ok(result) => result,
        Err(e) => {
            warn!("AI analysis failed, storing raw text only: {:?}", e);
            AnalysisResult::empty(&subject_name, &file.file_name)
        }
    };

    // 4. Merge into the existing subject or store a new one
    let session = match existing {
        Some(existing) => {
            let update = merge::build_update(
                &existing,
                analysis,
                &file.file_name,
                &extracted_text,
                description.as_deref(),
            );
            state
                .chats
                .update_chat(existing.id, update)
                .await
                .map_err(|e| port_failure(e, "Failed to process upload"))?
        }
        None => state
            .chats
            .add_chat(NewChatSession {
                subject: subject_name,
                description: description.unwrap_or_default(),
                extracted_text,
                file_name: file.file_name,
                topics: analysis.topics,
                key_concepts: analysis.key_concepts,
            })
            .await
            .map_err(|e| port_failure(e, "Failed to process upload"))?,
    };
    info!(chat_id = %session.id, subject = %session.subject, "Study material stored");

    Ok(session)
}
