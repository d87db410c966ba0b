/// Shared application state
use crate::services::AuthService;
use playlister_core::DatabaseManager;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseManager>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(db: Arc<dyn DatabaseManager>, auth_service: Arc<AuthService>) -> Self {
        Self { db, auth_service }
    }
}
