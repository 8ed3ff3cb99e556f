//! Core error type

/// Errors raised by the store, the models and storage
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Timer not found: {0}")]
    TimerNotFound(u32),

    #[error("Preset not found: {0}")]
    PresetNotFound(u32),

    #[error("Id already in use: {0}")]
    DuplicateId(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
