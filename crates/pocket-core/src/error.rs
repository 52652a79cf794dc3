use thiserror::Error;

use crate::types::EntityKind;

/// Top-level error type for the Pocket stores.
///
/// Subsystem crates with their own error enums implement
/// `From<SubsystemError> for PocketError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PocketError {
    /// The database file could not be opened or the schema was rejected.
    #[error("Storage initialization failed: {0}")]
    StorageInit(String),

    /// A single statement failed inside the SQLite engine.
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} record {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    #[error("Sync failed: {0}")]
    Sync(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PocketError {
    /// True for failures the caller can recover from by re-prompting or
    /// retrying. Only storage initialization is fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PocketError::StorageInit(_))
    }
}

impl From<toml::de::Error> for PocketError {
    fn from(err: toml::de::Error) -> Self {
        PocketError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PocketError {
    fn from(err: toml::ser::Error) -> Self {
        PocketError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PocketError {
    fn from(err: serde_json::Error) -> Self {
        PocketError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Pocket operations.
pub type Result<T> = std::result::Result<T, PocketError>;
