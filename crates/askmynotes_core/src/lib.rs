pub mod domain;
pub mod merge;
pub mod ports;

pub use domain::{
    AnalysisInput, AnalysisResult, ChatInput, ChatRole, ChatSession, ChatSessionUpdate, ChatTurn,
    KeyConcept, ModelReply, NewChatSession, PracticeInput, Topic, User, UserCredentials,
    MAX_SUBJECTS,
};
pub use ports::{ChatStore, PortError, PortResult, StudyAssistant, TextExtractor, UserStore};
