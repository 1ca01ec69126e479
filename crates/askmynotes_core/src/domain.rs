//! crates/askmynotes_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database. Model replies that reach the
//! client untouched are kept as raw JSON values.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The maximum number of distinct subjects a deployment may hold at once.
pub const MAX_SUBJECTS: usize = 3;

// Represents a user - safe to hand back to clients
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// One topic extracted from a subject's notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topic {
    pub topic_name: String,
    pub subtopics: Vec<String>,
    pub summary: String,
    pub citations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyConcept {
    pub concept: String,
    pub definition: String,
    pub citation: String,
}

/// A subject notebook: the accumulated notes for one subject and their
/// AI-derived breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    pub id: Uuid,
    pub subject: String,
    pub description: String,
    pub extracted_text: String,
    pub file_name: String,
    pub topics: Vec<Topic>,
    pub key_concepts: Vec<KeyConcept>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to store a brand new subject.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChatSession {
    pub subject: String,
    pub description: String,
    pub extracted_text: String,
    pub file_name: String,
    pub topics: Vec<Topic>,
    pub key_concepts: Vec<KeyConcept>,
}

/// The fields rewritten when more notes are uploaded to an existing subject.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSessionUpdate {
    pub topics: Vec<Topic>,
    pub key_concepts: Vec<KeyConcept>,
    pub extracted_text: String,
    pub file_name: String,
    pub description: String,
}

impl ChatSession {
    pub fn from_new(new: NewChatSession) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: new.subject,
            description: new.description,
            extracted_text: new.extracted_text,
            file_name: new.file_name,
            topics: new.topics,
            key_concepts: new.key_concepts,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, update: ChatSessionUpdate) {
        self.topics = update.topics;
        self.key_concepts = update.key_concepts;
        self.extracted_text = update.extracted_text;
        self.file_name = update.file_name;
        self.description = update.description;
    }

    /// Case-insensitive comparison against a subject name.
    pub fn is_subject(&self, subject: &str) -> bool {
        self.subject.to_lowercase() == subject.to_lowercase()
    }
}

//=========================================================================================
// LLM Inputs and Results
//=========================================================================================

#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub subject_name: String,
    pub optional_description: Option<String>,
    pub file_name: String,
    pub extracted_text: String,
}

/// The structured breakdown the model produces for a single upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    pub subject: String,
    pub file_name: String,
    pub topics: Vec<Topic>,
    pub key_concepts: Vec<KeyConcept>,
}

impl AnalysisResult {
    /// The result used when the model could not analyse an upload.
    pub fn empty(subject: &str, file_name: &str) -> Self {
        Self {
            subject: subject.to_string(),
            file_name: file_name.to_string(),
            topics: Vec::new(),
            key_concepts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// A previous message in the conversation, replayed to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ChatInput {
    pub subject_name: String,
    pub extracted_text: String,
    pub question: String,
    pub history: Vec<ChatTurn>,
}

/// A chat answer or practice set, returned to the client exactly as the model
/// produced it.
pub type ModelReply = serde_json::Value;

#[derive(Debug, Clone)]
pub struct PracticeInput {
    pub subject_name: String,
    pub topic: Option<String>,
    pub extracted_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_match_ignores_case() {
        let session = ChatSession::from_new(NewChatSession {
            subject: "Biology".to_string(),
            description: String::new(),
            extracted_text: "cells".to_string(),
            file_name: "bio.txt".to_string(),
            topics: vec![],
            key_concepts: vec![],
        });

        assert!(session.is_subject("biology"));
        assert!(session.is_subject("BIOLOGY"));
        assert!(!session.is_subject("Biology 2"));
    }

    #[test]
    fn apply_rewrites_mutable_fields_only() {
        let mut session = ChatSession::from_new(NewChatSession {
            subject: "History".to_string(),
            description: "old".to_string(),
            extracted_text: "a".to_string(),
            file_name: "a.txt".to_string(),
            topics: vec![],
            key_concepts: vec![],
        });
        let id = session.id;

        session.apply(ChatSessionUpdate {
            topics: vec![Topic {
                topic_name: "Rome".to_string(),
                ..Default::default()
            }],
            key_concepts: vec![],
            extracted_text: "a b".to_string(),
            file_name: "a.txt, b.txt".to_string(),
            description: "new".to_string(),
        });

        assert_eq!(session.id, id);
        assert_eq!(session.subject, "History");
        assert_eq!(session.file_name, "a.txt, b.txt");
        assert_eq!(session.description, "new");
        assert_eq!(session.topics.len(), 1);
    }
}
