use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Channel '{channel}' not registered")]
    UnknownChannel { channel: String },

    #[error("Invalid arguments for '{channel}': {reason}")]
    InvalidArgs { channel: String, reason: String },

    #[error("Store writer is no longer running")]
    WriterClosed,
}

pub type Result<T> = std::result::Result<T, StoreError>;
