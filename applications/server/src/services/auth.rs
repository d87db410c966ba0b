/// Authentication service - JWT session cookies and password handling
use crate::error::{Result, ServerError};
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use playlister_core::UserId;
use serde::{Deserialize, Serialize};

/// Name of the HTTP-only cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

/// Cost range bcrypt accepts
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone)]
pub struct AuthService {
    secret: String,
    session_expiration: Duration,
    secure_cookies: bool,
    bcrypt_cost: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

impl AuthService {
    pub fn new(
        secret: String,
        session_expiration_hours: u64,
        secure_cookies: bool,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            secret,
            session_expiration: Duration::hours(session_expiration_hours as i64),
            secure_cookies,
            bcrypt_cost,
        }
    }

    /// Hash a password using bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.bcrypt_cost).map_err(ServerError::from)
    }

    /// Verify a password against a hash
    ///
    /// A malformed stored hash counts as a mismatch so login failures stay
    /// indistinguishable.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or_else(|e| {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            false
        })
    }

    /// Create a signed session token for the user
    pub fn create_session_token(&self, user_id: &UserId) -> Result<String> {
        let now = Utc::now();
        let exp = now + self.session_expiration;

        let claims = Claims {
            sub: user_id.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &encoding_key).map_err(ServerError::from)
    }

    /// Verify a session token and return the user it was issued to
    pub fn verify_session_token(&self, token: &str) -> Result<UserId> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(UserId::new(token_data.claims.sub))
    }

    /// HTTP-only cookie carrying a fresh session token
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Strict)
            .build()
    }

    /// Cookie that, passed to `CookieJar::remove`, expires the session
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .build()
    }
}
