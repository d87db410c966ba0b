//! Playlister Storage
//!
//! Two interchangeable implementations of `playlister_core::DatabaseManager`:
//!
//! - **Document** ([`DocumentDatabase`]): embedded redb store holding JSON
//!   documents, with unique indexes kept as separate tables
//! - **Relational** ([`RelationalDatabase`]): SQLite through `SQLx`, with
//!   embedded migrations and native UNIQUE / FOREIGN KEY constraints
//!
//! Both produce the same observable behavior; they differ only in how ids are
//! minted (UUID vs integer row id) and how the user -> playlist relationship is
//! materialized (embedded id array vs `playlists.user_id`).
//!
//! # Example
//!
//! ```rust,no_run
//! use playlister_core::{Backend, DatabaseManager};
//! use playlister_storage::{open_database, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatabaseConfig {
//!     backend: Backend::Relational,
//!     ..DatabaseConfig::default()
//! };
//! let db = open_database(&config).await?;
//! let songs = db.get_all_songs(Default::default()).await?;
//! # Ok(())
//! # }
//! ```

mod error;

pub mod document;
pub mod relational;

pub use document::DocumentDatabase;
pub use error::{Result, StorageError};
pub use relational::RelationalDatabase;

use playlister_core::{Backend, DatabaseManager};
use serde::{Deserialize, Serialize};
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Which store to open and where it lives
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: Backend,

    /// SQLite connection string, used by the relational backend
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// redb file, used by the document backend
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            database_url: default_database_url(),
            document_path: default_document_path(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://./data/playlister.db".to_string()
}

fn default_document_path() -> PathBuf {
    PathBuf::from("./data/playlister.redb")
}

/// Open the configured backend, applying migrations where needed
///
/// # Errors
///
/// Returns an error if the store cannot be opened or migrated
pub async fn open_database(config: &DatabaseConfig) -> Result<Arc<dyn DatabaseManager>> {
    let db: Arc<dyn DatabaseManager> = match config.backend {
        Backend::Document => Arc::new(DocumentDatabase::open(&config.document_path).await?),
        Backend::Relational => {
            let pool = create_pool(&config.database_url).await?;
            run_migrations(&pool).await?;
            Arc::new(RelationalDatabase::from_pool(pool))
        }
    };
    tracing::info!(backend = %config.backend, "Database opened");
    Ok(db)
}

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://playlister.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(%database_url, "Creating SQLite pool");

    if let Some(parent) = sqlite_file_parent(database_url) {
        std::fs::create_dir_all(parent)
            .map_err(|e| StorageError::Connection(format!("{}: {e}", parent.display())))?;
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Directory that must exist before SQLite can create the database file
fn sqlite_file_parent(database_url: &str) -> Option<&std::path::Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_parent_directory_of_sqlite_file() {
        assert_eq!(
            sqlite_file_parent("sqlite://./data/playlister.db"),
            Some(std::path::Path::new("./data"))
        );
        assert_eq!(sqlite_file_parent("sqlite::memory:"), None);
        assert_eq!(sqlite_file_parent("sqlite://local.db"), None);
    }
}
