//! services/api/src/adapters/memory.rs
//!
//! In-process implementations of the `UserStore` and `ChatStore` ports. Data
//! lives only as long as the server process.

use async_trait::async_trait;
use chrono::Utc;
use askmynotes_core::domain::{
    ChatSession, ChatSessionUpdate, NewChatSession, User, UserCredentials,
};
use askmynotes_core::ports::{ChatStore, PortError, PortResult, UserStore};
use tokio::sync::RwLock;
use uuid::Uuid;

//=========================================================================================
// Users
//=========================================================================================

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<UserCredentials>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> PortResult<User> {
        let email = email.to_lowercase();
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.user.email == email) {
            return Err(PortError::Conflict(format!("Email {} already in use", email)));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email,
            created_at: Utc::now(),
        };
        users.push(UserCredentials {
            user: user.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let email = email.to_lowercase();
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.user.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.user.id == user_id)
            .map(|u| u.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }
}

//=========================================================================================
// Chat sessions
//=========================================================================================

#[derive(Default)]
pub struct MemoryChatStore {
    chats: RwLock<Vec<ChatSession>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store, e.g. from a file loaded at startup.
    pub fn with_chats(chats: Vec<ChatSession>) -> Self {
        Self {
            chats: RwLock::new(chats),
        }
    }

    /// A copy of everything currently stored, in insertion order.
    pub async fn snapshot(&self) -> Vec<ChatSession> {
        self.chats.read().await.clone()
    }

    /// Swaps in a new set of chats wholesale.
    pub async fn replace(&self, chats: Vec<ChatSession>) {
        *self.chats.write().await = chats;
    }
}

fn newest_first(mut chats: Vec<ChatSession>) -> Vec<ChatSession> {
    chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    chats
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn list_chats(&self) -> PortResult<Vec<ChatSession>> {
        Ok(newest_first(self.snapshot().await))
    }

    async fn get_chat(&self, id: Uuid) -> PortResult<ChatSession> {
        self.chats
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Chat {} not found", id)))
    }

    async fn get_chat_by_subject(&self, subject: &str) -> PortResult<Option<ChatSession>> {
        Ok(self
            .chats
            .read()
            .await
            .iter()
            .find(|c| c.is_subject(subject))
            .cloned())
    }

    async fn add_chat(&self, session: NewChatSession) -> PortResult<ChatSession> {
        let chat = ChatSession::from_new(session);
        self.chats.write().await.push(chat.clone());
        Ok(chat)
    }

    async fn update_chat(&self, id: Uuid, update: ChatSessionUpdate) -> PortResult<ChatSession> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Chat {} not found", id)))?;
        chat.apply(update);
        Ok(chat.clone())
    }

    async fn delete_chat(&self, id: Uuid) -> PortResult<()> {
        self.chats.write().await.retain(|c| c.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_chat(subject: &str) -> NewChatSession {
        NewChatSession {
            subject: subject.to_string(),
            description: String::new(),
            extracted_text: format!("{subject} notes"),
            file_name: format!("{subject}.txt"),
            topics: vec![],
            key_concepts: vec![],
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryUserStore::new();
        store.create_user("Ada", "Ada@Example.com", "hash").await.unwrap();

        let err = store.create_user("Other", "ada@example.com", "hash").await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn users_are_found_by_email_and_id() {
        let store = MemoryUserStore::new();
        let user = store.create_user("Ada", "ADA@example.com", "hash").await.unwrap();
        assert_eq!(user.email, "ada@example.com");

        let creds = store.get_user_by_email("Ada@Example.com").await.unwrap();
        assert_eq!(creds.user.id, user.id);
        assert_eq!(creds.password_hash, "hash");

        assert_eq!(store.get_user_by_id(user.id).await.unwrap(), user);
        assert!(matches!(
            store.get_user_by_id(Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn chats_list_newest_first_and_delete() {
        let store = MemoryChatStore::new();
        let first = store.add_chat(new_chat("Biology")).await.unwrap();
        let second = store.add_chat(new_chat("Chemistry")).await.unwrap();

        let listed = store.list_chats().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);

        store.delete_chat(first.id).await.unwrap();
        let listed = store.list_chats().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);

        // deleting again is harmless
        store.delete_chat(first.id).await.unwrap();
    }

    #[tokio::test]
    async fn subject_lookup_is_case_insensitive() {
        let store = MemoryChatStore::new();
        let chat = store.add_chat(new_chat("Biology")).await.unwrap();

        let found = store.get_chat_by_subject("BIOLOGY").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(chat.id));
        assert!(store.get_chat_by_subject("Physics").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_of_missing_chat_is_not_found() {
        let store = MemoryChatStore::new();
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
    }
}
