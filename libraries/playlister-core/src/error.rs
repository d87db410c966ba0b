/// Core error types for Playlister
use thiserror::Error;

/// Result type alias using `PlaylisterError`
pub type Result<T> = std::result::Result<T, PlaylisterError>;

/// Core error type shared by every persistence adapter
#[derive(Error, Debug)]
pub enum PlaylisterError {
    /// Entity not found where the operation needs it to exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A user with this email already exists
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A catalog song with this title, artist and year already exists
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Caller does not own the resource
    #[error("Permission denied")]
    PermissionDenied,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage-related errors (connection, engine, I/O)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Query/transaction failures reported by the engine
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl PlaylisterError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
