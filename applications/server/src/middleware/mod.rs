/// Request extractors shared by the API handlers
pub mod auth;

pub use auth::{AuthenticatedUser, CurrentUser};
