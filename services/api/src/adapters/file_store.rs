//! services/api/src/adapters/file_store.rs
//!
//! A `ChatStore` persisted as a single JSON array on disk. Every change is
//! applied to a copy, the whole file is rewritten from that copy, and only a
//! successful write makes the change visible. Writers are serialized.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use askmynotes_core::domain::{ChatSession, ChatSessionUpdate, NewChatSession};
use askmynotes_core::ports::{ChatStore, PortError, PortResult};
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::adapters::memory::MemoryChatStore;
use crate::adapters::records::ChatSessionRecord;

pub struct FileChatStore {
    path: PathBuf,
    inner: MemoryChatStore,
    writer: Mutex<()>,
}

impl FileChatStore {
    /// Loads the store from `path`. A missing file starts an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> PortResult<Self> {
        let path = path.into();
        let chats = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => {
                let records: Vec<ChatSessionRecord> = serde_json::from_slice(&bytes)
                    .map_err(|e| {
                        PortError::Unexpected(format!(
                            "Chat store file {} is corrupt: {}",
                            path.display(),
                            e
                        ))
                    })?;
                records.into_iter().map(ChatSessionRecord::to_domain).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };
        info!("Loaded {} chat sessions from {}", chats.len(), path.display());

        Ok(Self {
            path,
            inner: MemoryChatStore::with_chats(chats),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_file(&self, chats: &[ChatSession]) -> PortResult<()> {
        let records: Vec<ChatSessionRecord> = chats.iter().map(ChatSessionRecord::from).collect();
        let json = serde_json::to_vec_pretty(&records)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            error!("Failed to write chat store {}: {:?}", self.path.display(), e);
            PortError::Unexpected(e.to_string())
        })
    }

    /// Writes `chats` to disk, then publishes them. Callers hold `writer`.
    async fn commit(&self, chats: Vec<ChatSession>) -> PortResult<()> {
        self.write_file(&chats).await?;
        self.inner.replace(chats).await;
        Ok(())
    }
}

#[async_trait]
impl ChatStore for FileChatStore {
    async fn list_chats(&self) -> PortResult<Vec<ChatSession>> {
        self.inner.list_chats().await
    }

    async fn get_chat(&self, id: Uuid) -> PortResult<ChatSession> {
        self.inner.get_chat(id).await
    }

    async fn get_chat_by_subject(&self, subject: &str) -> PortResult<Option<ChatSession>> {
        self.inner.get_chat_by_subject(subject).await
    }

    async fn add_chat(&self, session: NewChatSession) -> PortResult<ChatSession> {
        let _writer = self.writer.lock().await;
        let mut chats = self.inner.snapshot().await;
        let chat = ChatSession::from_new(session);
        chats.push(chat.clone());
        self.commit(chats).await?;
        Ok(chat)
    }

    async fn update_chat(&self, id: Uuid, update: ChatSessionUpdate) -> PortResult<ChatSession> {
        let _writer = self.writer.lock().await;
        let mut chats = self.inner.snapshot().await;
        let chat = chats
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Chat {} not found", id)))?;
        chat.apply(update);
        let updated = chat.clone();
        self.commit(chats).await?;
        Ok(updated)
    }

    async fn delete_chat(&self, id: Uuid) -> PortResult<()> {
        let _writer = self.writer.lock().await;
        let mut chats = self.inner.snapshot().await;
        let before = chats.len();
        chats.retain(|c| c.id != id);
        if chats.len() == before {
            return Ok(());
        }
        self.commit(chats).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askmynotes_core::domain::Topic;

    fn new_chat(subject: &str) -> NewChatSession {
        NewChatSession {
            subject: subject.to_string(),
            description: "intro course".to_string(),
            extracted_text: "Cells are the unit of life.".to_string(),
            file_name: "bio.txt".to_string(),
            topics: vec![Topic {
                topic_name: "Cells".to_string(),
                subtopics: vec!["Membrane".to_string()],
                summary: "About cells.".to_string(),
                citations: vec!["unit of life".to_string()],
            }],
            key_concepts: vec![],
        }
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChatStore::open(dir.path().join("chats.json")).await.unwrap();
        assert!(store.list_chats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chats.json");

        let store = FileChatStore::open(&path).await.unwrap();
        let chat = store.add_chat(new_chat("Biology")).await.unwrap();
        drop(store);

        let reopened = FileChatStore::open(&path).await.unwrap();
        let loaded = reopened.get_chat(chat.id).await.unwrap();
        assert_eq!(loaded.subject, "Biology");
        assert_eq!(loaded.topics, chat.topics);
        assert_eq!(loaded.created_at, chat.created_at);
    }

    #[tokio::test]
    async fn delete_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chats.json");

        let store = FileChatStore::open(&path).await.unwrap();
        let chat = store.add_chat(new_chat("Biology")).await.unwrap();
        store.delete_chat(chat.id).await.unwrap();

        let reopened = FileChatStore::open(&path).await.unwrap();
        assert!(reopened.list_chats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chats.json");

        let store = FileChatStore::open(&path).await.unwrap();
        let kept = store.add_chat(new_chat("Biology")).await.unwrap();

        // A directory where the file should be makes every write fail.
        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::create_dir(&path).await.unwrap();

        assert!(store.add_chat(new_chat("Chemistry")).await.is_err());
        assert_eq!(store.list_chats().await.unwrap().len(), 1);
        assert!(store.get_chat_by_subject("Chemistry").await.unwrap().is_none());

        let update = ChatSessionUpdate {
            topics: vec![],
            key_concepts: vec![],
            extracted_text: "rewritten".to_string(),
            file_name: "other.txt".to_string(),
            description: String::new(),
        };
        assert!(store.update_chat(kept.id, update).await.is_err());
        let unchanged = store.get_chat(kept.id).await.unwrap();
        assert_eq!(unchanged.extracted_text, kept.extracted_text);
        assert_eq!(unchanged.file_name, "bio.txt");

        assert!(store.delete_chat(kept.id).await.is_err());
        assert!(store.get_chat(kept.id).await.is_ok());
    }

    #[tokio::test]
    async fn update_of_missing_chat_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chats.json");
        let store = FileChatStore::open(&path).await.unwrap();

        let update = ChatSessionUpdate {
            topics: vec![],
            key_concepts: vec![],
            extracted_text: String::new(),
            file_name: String::new(),
            description: String::new(),
        };
        assert!(matches!(
            store.update_chat(Uuid::new_v4(), update).await,
            Err(PortError::NotFound(_))
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chats.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        assert!(matches!(
            FileChatStore::open(&path).await,
            Err(PortError::Unexpected(_))
        ));
    }
}
