/// Server services
pub mod auth;
pub mod catalog;

pub use auth::AuthService;
