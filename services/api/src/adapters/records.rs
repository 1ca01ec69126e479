//! services/api/src/adapters/records.rs
//!
//! "Impure" serde mirrors of the domain structs. Adapters read and write these
//! (JSON file, JSONB columns, model output) and convert at the boundary.
//! Every field defaults so partial JSON from the model still parses.

use askmynotes_core::domain::{ChatSession, KeyConcept, Topic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TopicRecord {
    pub topic_name: String,
    pub subtopics: Vec<String>,
    pub summary: String,
    pub citations: Vec<String>,
}

impl TopicRecord {
    pub fn to_domain(self) -> Topic {
        Topic {
            topic_name: self.topic_name,
            subtopics: self.subtopics,
            summary: self.summary,
            citations: self.citations,
        }
    }
}

impl From<&Topic> for TopicRecord {
    fn from(t: &Topic) -> Self {
        Self {
            topic_name: t.topic_name.clone(),
            subtopics: t.subtopics.clone(),
            summary: t.summary.clone(),
            citations: t.citations.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct KeyConceptRecord {
    pub concept: String,
    pub definition: String,
    pub citation: String,
}

impl KeyConceptRecord {
    pub fn to_domain(self) -> KeyConcept {
        KeyConcept {
            concept: self.concept,
            definition: self.definition,
            citation: self.citation,
        }
    }
}

impl From<&KeyConcept> for KeyConceptRecord {
    fn from(k: &KeyConcept) -> Self {
        Self {
            concept: k.concept.clone(),
            definition: k.definition.clone(),
            citation: k.citation.clone(),
        }
    }
}

/// A whole subject as written to the JSON file store.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatSessionRecord {
    pub id: Uuid,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub extracted_text: String,
    pub file_name: String,
    #[serde(default)]
    pub topics: Vec<TopicRecord>,
    #[serde(default)]
    pub key_concepts: Vec<KeyConceptRecord>,
    pub created_at: DateTime<Utc>,
}

impl ChatSessionRecord {
    pub fn to_domain(self) -> ChatSession {
        ChatSession {
            id: self.id,
            subject: self.subject,
            description: self.description,
            extracted_text: self.extracted_text,
            file_name: self.file_name,
            topics: self.topics.into_iter().map(TopicRecord::to_domain).collect(),
            key_concepts: self
                .key_concepts
                .into_iter()
                .map(KeyConceptRecord::to_domain)
                .collect(),
            created_at: self.created_at,
        }
    }
}

impl From<&ChatSession> for ChatSessionRecord {
    fn from(c: &ChatSession) -> Self {
        Self {
            id: c.id,
            subject: c.subject.clone(),
            description: c.description.clone(),
            extracted_text: c.extracted_text.clone(),
            file_name: c.file_name.clone(),
            topics: c.topics.iter().map(TopicRecord::from).collect(),
            key_concepts: c.key_concepts.iter().map(KeyConceptRecord::from).collect(),
            created_at: c.created_at,
        }
    }
}
