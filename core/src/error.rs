/// Error types for the conversation sync engine
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Push channel error: {0}")]
    Transport(String),

    #[error("Authorization expired")]
    Auth,

    #[error("Unknown conversation: {0}")]
    UnknownConversation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Send failed: {0}")]
    Send(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
