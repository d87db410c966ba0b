/// Account API routes
use crate::{
    error::{Result, ServerError},
    extract::Json,
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use playlister_core::{NewUser, User, UserUpdate};
use serde::{Deserialize, Deserializer, Serialize};

const MIN_PASSWORD_LENGTH: usize = 8;
const LOGIN_FAILED: &str = "Wrong email or password provided.";

/// Public view of a user; never includes the password hash
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_name: String,
    pub email: String,
    pub avatar_image: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            user_name: user.user_name,
            email: user.email,
            avatar_image: user.avatar_image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserSummary,
}

impl UserResponse {
    fn new(user: User) -> Json<Self> {
        Json(Self {
            success: true,
            user: user.into(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedInResponse {
    pub logged_in: bool,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_verify: Option<String>,
    pub avatar_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Profile changes. Any `email` in the body is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub password_verify: Option<String>,
    /// Absent leaves the avatar alone, `null` clears it
    #[serde(default, deserialize_with = "present")]
    pub avatar_image: Option<Option<String>>,
}

/// Distinguish an explicit `null` from a missing field
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn check_new_password(password: &str, verify: Option<&str>) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServerError::BadRequest(format!(
            "Please enter a password of at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    if verify != Some(password) {
        return Err(ServerError::BadRequest(
            "Please enter the same password twice.".to_string(),
        ));
    }
    Ok(())
}

/// POST /auth/register
///
/// Creates the account without logging it in.
pub async fn register(
    State(app_state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserResponse>> {
    let (Some(user_name), Some(email), Some(password), Some(password_verify)) = (
        non_empty(req.user_name),
        non_empty(req.email),
        non_empty(req.password),
        non_empty(req.password_verify),
    ) else {
        return Err(ServerError::BadRequest(
            "Please enter all required fields.".to_string(),
        ));
    };

    if user_name.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "User name cannot be empty or only whitespace.".to_string(),
        ));
    }
    check_new_password(&password, Some(&password_verify))?;

    if app_state.db.find_user_by_email(&email).await?.is_some() {
        return Err(ServerError::Conflict(
            "An account with this email address already exists.".to_string(),
        ));
    }

    let password_hash = app_state.auth_service.hash_password(&password)?;
    let user = app_state
        .db
        .create_user(NewUser {
            user_name,
            email,
            password_hash,
            avatar_image: req.avatar_image,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Registered user");
    Ok(UserResponse::new(user))
}

/// POST /auth/login
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>)> {
    let (Some(email), Some(password)) = (non_empty(req.email), non_empty(req.password)) else {
        return Err(ServerError::BadRequest(
            "Please enter all required fields.".to_string(),
        ));
    };

    let user = app_state
        .db
        .find_user_by_email(&email)
        .await?
        .filter(|user| {
            app_state
                .auth_service
                .verify_password(&password, &user.password_hash)
        })
        .ok_or_else(|| ServerError::Auth(LOGIN_FAILED.to_string()))?;

    let token = app_state.auth_service.create_session_token(&user.id)?;
    let jar = jar.add(app_state.auth_service.session_cookie(token));

    tracing::debug!(user_id = %user.id, "User logged in");
    Ok((jar, UserResponse::new(user)))
}

/// GET|POST /auth/logout
pub async fn logout(State(app_state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(app_state.auth_service.removal_cookie());
    (jar, StatusCode::OK)
}

/// GET /auth/loggedIn
///
/// Never fails: a missing, invalid or orphaned session reports `loggedIn: false`.
pub async fn logged_in(
    State(app_state): State<AppState>,
    session: Option<AuthenticatedUser>,
) -> Result<Json<LoggedInResponse>> {
    let user = match session {
        Some(session) => app_state.db.find_user_by_id(session.user_id()).await?,
        None => None,
    };

    Ok(Json(LoggedInResponse {
        logged_in: user.is_some(),
        user: user.map(UserSummary::from),
    }))
}

/// PUT /auth/update
pub async fn update_user(
    State(app_state): State<AppState>,
    session: AuthenticatedUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let mut update = UserUpdate {
        user_name: req.user_name,
        password_hash: None,
        avatar_image: req.avatar_image,
    };

    if let Some(password) = non_empty(req.password) {
        check_new_password(&password, req.password_verify.as_deref())?;
        update.password_hash = Some(app_state.auth_service.hash_password(&password)?);
    }

    let user = app_state
        .db
        .update_user(session.user_id(), update)
        .await?
        .ok_or_else(|| ServerError::NotFound("User not found".to_string()))?;

    Ok(UserResponse::new(user))
}
