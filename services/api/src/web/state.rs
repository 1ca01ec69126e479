//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::token::TokenKeys;
use askmynotes_core::ports::{ChatStore, StudyAssistant, TextExtractor, UserStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub chats: Arc<dyn ChatStore>,
    pub assistant: Arc<dyn StudyAssistant>,
    pub extractor: Arc<dyn TextExtractor>,
    pub tokens: TokenKeys,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserStore>,
        chats: Arc<dyn ChatStore>,
        assistant: Arc<dyn StudyAssistant>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let tokens = TokenKeys::new(&config.jwt_secret, config.jwt_expires_in);
        Self {
            users,
            chats,
            assistant,
            extractor,
            tokens,
            config,
        }
    }
}
