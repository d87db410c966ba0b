//! Playlister Server Library
//!
//! REST backend for user accounts, playlists and the shared song catalog,
//! backed by either storage engine from `playlister-storage`.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use api::create_router;
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::AuthService;
pub use state::AppState;
