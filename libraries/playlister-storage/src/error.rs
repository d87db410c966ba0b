/// Storage-specific errors
use playlister_core::{NaturalKey, PlaylisterError};
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection error
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Migration error
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Error from the embedded document store
    #[error(transparent)]
    Document(#[from] redb::Error),

    /// Serialization/deserialization error
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Blocking task panicked or was cancelled
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Stored value could not be mapped back to a domain type
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Domain outcome raised from inside a storage operation
    #[error(transparent)]
    Core(#[from] PlaylisterError),
}

impl StorageError {
    /// Map a `SQLx` error, turning a unique-constraint violation into `duplicate`.
    ///
    /// The engine's constraint is the real guard against duplicates; an
    /// application pre-check can lose a race, this catches the loser.
    pub fn from_sqlx(err: sqlx::Error, duplicate: impl FnOnce() -> PlaylisterError) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Core(duplicate());
            }
        }
        Self::Database(err)
    }
}

/// Duplicate-email outcome, shared by both adapters
pub(crate) fn duplicate_email() -> PlaylisterError {
    PlaylisterError::DuplicateKey("An account with this email address already exists.".to_string())
}

/// Duplicate natural-key outcome, shared by both adapters
pub(crate) fn duplicate_song(key: &NaturalKey) -> PlaylisterError {
    PlaylisterError::DuplicateEntry(format!("Song {key} already exists"))
}

macro_rules! redb_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StorageError {
                fn from(err: $ty) -> Self {
                    Self::Document(redb::Error::from(err))
                }
            }
        )*
    };
}

redb_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<StorageError> for PlaylisterError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Core(inner) => inner,
            StorageError::Serialization(e) => PlaylisterError::Serialization(e),
            StorageError::Database(e) => PlaylisterError::database(e.to_string()),
            other => PlaylisterError::storage(other.to_string()),
        }
    }
}
