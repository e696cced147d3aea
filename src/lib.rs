pub mod actors;
pub mod config;
pub mod discord;
pub mod error;
pub mod game;
pub mod render;
pub mod words;

// Re-export error types for convenience
pub use error::{Error, GameError, Result, SessionError, WordBankError};

// Shared with every command and event handler
pub struct Data {
    pub session_store: actix::Addr<actors::SessionStoreActor>,
}
