pub mod db;
pub mod extract;
pub mod file_store;
pub mod groq_llm;
pub mod memory;
pub mod records;

pub use db::DbAdapter;
pub use extract::PdfTextExtractor;
pub use file_store::FileChatStore;
pub use groq_llm::GroqStudyAdapter;
pub use memory::{MemoryChatStore, MemoryUserStore};
