/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use playlister_core::PlaylisterError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Session user does not own the playlist
    #[error("Not the owner of this playlist")]
    NotOwner,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(PlaylisterError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

impl From<PlaylisterError> for ServerError {
    fn from(err: PlaylisterError) -> Self {
        match err {
            PlaylisterError::NotFound { entity, .. } => {
                ServerError::NotFound(format!("{entity} not found"))
            }
            PlaylisterError::DuplicateKey(msg) | PlaylisterError::DuplicateEntry(msg) => {
                ServerError::Conflict(msg)
            }
            PlaylisterError::PermissionDenied => ServerError::NotOwner,
            PlaylisterError::InvalidInput(msg) => ServerError::BadRequest(msg),
            other => ServerError::Database(other),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServerError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            ServerError::NotOwner => (StatusCode::BAD_REQUEST, "authentication error".to_string()),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::BadRequest(msg) | ServerError::Conflict(msg) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            ServerError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            ServerError::Jwt(ref e) => {
                tracing::debug!("JWT error: {:?}", e);
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
            }
            ServerError::Bcrypt(ref e) => {
                tracing::error!("Bcrypt error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Password error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "errorMessage": error_message,
        }));

        (status, body).into_response()
    }
}
