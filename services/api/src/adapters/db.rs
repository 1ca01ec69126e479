//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the PostgreSQL implementation of
//! the `UserStore` and `ChatStore` ports from the `core` crate. It handles all
//! interactions with the database using `sqlx`.

use async_trait::async_trait;
use askmynotes_core::domain::{
    ChatSession, ChatSessionUpdate, NewChatSession, User, UserCredentials,
};
use askmynotes_core::ports::{ChatStore, PortError, PortResult, UserStore};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::adapters::records::{KeyConceptRecord, TopicRecord};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user: User {
                id: self.id,
                name: self.name,
                email: self.email,
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct ChatSessionRow {
    id: Uuid,
    subject: String,
    description: String,
    extracted_text: String,
    file_name: String,
    topics: Json<Vec<TopicRecord>>,
    key_concepts: Json<Vec<KeyConceptRecord>>,
    created_at: DateTime<Utc>,
}
impl ChatSessionRow {
    fn to_domain(self) -> ChatSession {
        ChatSession {
            id: self.id,
            subject: self.subject,
            description: self.description,
            extracted_text: self.extracted_text,
            file_name: self.file_name,
            topics: self.topics.0.into_iter().map(TopicRecord::to_domain).collect(),
            key_concepts: self
                .key_concepts
                .0
                .into_iter()
                .map(KeyConceptRecord::to_domain)
                .collect(),
            created_at: self.created_at,
        }
    }
}

const CHAT_COLUMNS: &str =
    "id, subject, description, extracted_text, file_name, topics, key_concepts, created_at";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn topic_records(session_topics: &[askmynotes_core::Topic]) -> Json<Vec<TopicRecord>> {
    Json(session_topics.iter().map(TopicRecord::from).collect())
}

fn concept_records(concepts: &[askmynotes_core::KeyConcept]) -> Json<Vec<KeyConceptRecord>> {
    Json(concepts.iter().map(KeyConceptRecord::from).collect())
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email.to_lowercase())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::Conflict(format!("Email {} already in use", email))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain().user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email.to_lowercase())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain().user)
    }
}

//=========================================================================================
// `ChatStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatStore for DbAdapter {
    async fn list_chats(&self) -> PortResult<Vec<ChatSession>> {
        let rows = sqlx::query_as::<_, ChatSessionRow>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chat_sessions ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(rows.into_iter().map(ChatSessionRow::to_domain).collect())
    }

    async fn get_chat(&self, id: Uuid) -> PortResult<ChatSession> {
        let row = sqlx::query_as::<_, ChatSessionRow>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chat_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Chat {} not found", id)),
            _ => unexpected(e),
        })?;
        Ok(row.to_domain())
    }

    async fn get_chat_by_subject(&self, subject: &str) -> PortResult<Option<ChatSession>> {
        let row = sqlx::query_as::<_, ChatSessionRow>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chat_sessions WHERE lower(subject) = lower($1) LIMIT 1"
        ))
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(ChatSessionRow::to_domain))
    }

    async fn add_chat(&self, session: NewChatSession) -> PortResult<ChatSession> {
        let row = sqlx::query_as::<_, ChatSessionRow>(&format!(
            "INSERT INTO chat_sessions (id, subject, description, extracted_text, file_name, topics, key_concepts) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {CHAT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&session.subject)
        .bind(&session.description)
        .bind(&session.extracted_text)
        .bind(&session.file_name)
        .bind(topic_records(&session.topics))
        .bind(concept_records(&session.key_concepts))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.to_domain())
    }

    async fn update_chat(&self, id: Uuid, update: ChatSessionUpdate) -> PortResult<ChatSession> {
        let row = sqlx::query_as::<_, ChatSessionRow>(&format!(
            "UPDATE chat_sessions SET topics = $1, key_concepts = $2, extracted_text = $3, \
             file_name = $4, description = $5 WHERE id = $6 RETURNING {CHAT_COLUMNS}"
        ))
        .bind(topic_records(&update.topics))
        .bind(concept_records(&update.key_concepts))
        .bind(&update.extracted_text)
        .bind(&update.file_name)
        .bind(&update.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(ChatSessionRow::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("Chat {} not found", id)))
    }

    async fn delete_chat(&self, id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM chat_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
