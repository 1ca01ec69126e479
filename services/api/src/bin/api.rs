//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, FileChatStore, GroqStudyAdapter, MemoryChatStore, MemoryUserStore,
        PdfTextExtractor,
    },
    config::{Config, StoreBackend},
    error::ApiError,
    web::{self, state::AppState},
};
use askmynotes_core::ports::{ChatStore, UserStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Choose the Storage Backend ---
    let (users, chats): (Arc<dyn UserStore>, Arc<dyn ChatStore>) = match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory storage; data is lost on restart.");
            let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
            let chats: Arc<dyn ChatStore> = Arc::new(MemoryChatStore::new());
            (users, chats)
        }
        StoreBackend::File => {
            let store = FileChatStore::open(config.chat_store_path.clone()).await?;
            info!("Persisting chat sessions to {}", store.path().display());
            let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
            let chats: Arc<dyn ChatStore> = Arc::new(store);
            (users, chats)
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| ApiError::Internal("DATABASE_URL is required".to_string()))?;
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            let users: Arc<dyn UserStore> = db_adapter.clone();
            let chats: Arc<dyn ChatStore> = db_adapter;
            (users, chats)
        }
    };

    // --- 3. Initialize Service Adapters ---
    let groq_api_key = config
        .groq_api_key
        .as_deref()
        .ok_or_else(|| ApiError::Internal("GROQ_API_KEY is required".to_string()))?;
    let groq_client = GroqStudyAdapter::client_for(&config.groq_api_base, groq_api_key);
    let assistant = Arc::new(GroqStudyAdapter::new(groq_client, config.groq_model.clone()));
    let extractor = Arc::new(PdfTextExtractor::new());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        users,
        chats,
        assistant,
        extractor,
    ));

    // --- 5. Create the Web Router ---
    let app = web::router(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
