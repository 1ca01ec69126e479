//! services/api/src/error.rs
//!
//! Failures that stop the server from starting or serving. Request-level
//! failures never reach this type; handlers turn them into HTTP replies.

use crate::config::ConfigError;
use askmynotes_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required environment variable is missing or unparsable.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The chat store file could not be loaded, e.g. it holds invalid JSON.
    #[error("Chat store error: {0}")]
    Port(#[from] PortError),

    /// PostgreSQL was unreachable when the pool was built.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Binding the listener or serving connections failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A setting needed by the chosen backend or the Groq client is absent.
    #[error("Startup error: {0}")]
    Internal(String),
}
