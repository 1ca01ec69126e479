//! crates/askmynotes_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage backends or LLM providers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    AnalysisInput, AnalysisResult, ChatInput, ChatSession, ChatSessionUpdate, ModelReply,
    NewChatSession, PracticeInput, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered (case-insensitive).
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// All subjects, newest first.
    async fn list_chats(&self) -> PortResult<Vec<ChatSession>>;

    async fn get_chat(&self, id: Uuid) -> PortResult<ChatSession>;

    /// Exact, case-insensitive lookup by subject name.
    async fn get_chat_by_subject(&self, subject: &str) -> PortResult<Option<ChatSession>>;

    async fn add_chat(&self, session: NewChatSession) -> PortResult<ChatSession>;

    async fn update_chat(&self, id: Uuid, update: ChatSessionUpdate) -> PortResult<ChatSession>;

    /// Deleting an id that does not exist is not an error.
    async fn delete_chat(&self, id: Uuid) -> PortResult<()>;
}

//=========================================================================================
// External Service Ports
//=========================================================================================

#[async_trait]
pub trait StudyAssistant: Send + Sync {
    /// Breaks freshly uploaded material down into topics and key concepts.
    async fn analyze_material(&self, input: &AnalysisInput) -> PortResult<AnalysisResult>;

    /// Answers a question strictly from a subject's material. The reply is
    /// whatever JSON object the model returned.
    async fn chat_with_material(&self, input: &ChatInput) -> PortResult<ModelReply>;

    /// Generates multiple-choice and short-answer practice questions.
    async fn generate_practice(&self, input: &PracticeInput) -> PortResult<ModelReply>;
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Pulls plain text out of an uploaded file.
    async fn extract_text(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> PortResult<String>;
}
