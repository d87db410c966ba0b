/// Session extractors
use crate::{error::ServerError, services::auth::SESSION_COOKIE, state::AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use playlister_core::{User, UserId};

/// Identity carried by a valid session cookie.
///
/// Use as an extractor in handlers that require a login; wrap in `Option` for
/// handlers where the session is optional.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &UserId {
        &self.0
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ServerError::Auth("Not authenticated".to_string()))?;

        let user_id = state.auth_service.verify_session_token(&token).map_err(|e| {
            tracing::warn!("Token verification failed: {}", e);
            ServerError::Auth("Not authenticated".to_string())
        })?;

        Ok(AuthenticatedUser(user_id))
    }
}

/// The full record of the session user. Rejects with 401 if the account no
/// longer exists.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user_id) = AuthenticatedUser::from_request_parts(parts, state).await?;

        let user = state
            .db
            .find_user_by_id(&user_id)
            .await?
            .ok_or_else(|| ServerError::Auth("Not authenticated".to_string()))?;

        Ok(CurrentUser(user))
    }
}
