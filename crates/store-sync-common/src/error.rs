//! Error types shared across store-sync crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised before any store is contacted
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required key '{key}' in {path}")]
    MissingEnvKey { key: String, path: String },

    #[error("Parse error: {0}")]
    Parse(String),
}
