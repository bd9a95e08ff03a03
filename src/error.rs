// src/error.rs
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum DecodeError {
    #[error("Hex input has an odd number of digits")]
    OddLength,
    #[error("Hex input contains a pair that is not a valid byte")]
    InvalidDigit,
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum CommitError {
    #[error("Cannot save, fix hex input: {0}")]
    InvalidHex(#[from] DecodeError),
    #[error("Cannot save while the payload placeholder is shown; switch back to hex")]
    UndecodedPayload,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A record with the same key already exists")]
    AlreadyExists,
    #[error("Record not found")]
    NotFound,
    #[error("Access denied for group '{0}'")]
    Denied(String),
    #[error("Credential store query failed: {0}")]
    QueryFailed(String),
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String), // e.g., from bincode
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

#[derive(Debug, Error)]
pub enum InspectorError {
    #[error("No access group selected")]
    NoAccessGroup,
    #[error("Title must not be empty")]
    EmptyTitle,
    #[error("Record {0} is not in the current list")]
    RecordNotFound(uuid::Uuid),
    #[error("Another edit session is already open")]
    EditInProgress,
    #[error("No edit session is open")]
    NoEditSession,
    #[error(transparent)]
    Commit(#[from] CommitError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize config to TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Inspector(#[from] InspectorError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid payload: {0}")]
    Decode(#[from] DecodeError),
    #[error("CLI error: {0}")]
    Cli(String),
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type InspectorResult<T> = Result<T, InspectorError>;
