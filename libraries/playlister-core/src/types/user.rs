/// User domain types
use crate::error::{PlaylisterError, Result};
use crate::types::{PlaylistId, UserId};
use chrono::{DateTime, Utc};

/// Registered account
///
/// Not `Serialize`: the password hash must never reach a response body. The
/// server shapes its own summary type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user identifier
    pub id: UserId,

    /// Display name, not unique
    pub user_name: String,

    /// Login email, unique and stored lowercased
    pub email: String,

    /// bcrypt hash of the password
    pub password_hash: String,

    /// Opaque avatar image (usually a base64 data URL)
    pub avatar_image: Option<String>,

    /// Playlists attached to this user, in no particular order
    pub playlists: Vec<PlaylistId>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar_image: Option<String>,
}

impl NewUser {
    /// Trim the name, normalize the email and drop an empty avatar.
    ///
    /// Both adapters call this before writing so the stored record is the same
    /// regardless of backend.
    pub fn normalized(self) -> Result<Self> {
        let user_name = self.user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(PlaylisterError::invalid_input(
                "User name cannot be empty or only whitespace",
            ));
        }

        let email = normalize_email(&self.email);
        if email.is_empty() {
            return Err(PlaylisterError::invalid_input("Email is required"));
        }

        Ok(Self {
            user_name,
            email,
            password_hash: self.password_hash,
            avatar_image: self.avatar_image.filter(|a| !a.is_empty()),
        })
    }
}

/// Partial update for a user. Email is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub user_name: Option<String>,
    pub password_hash: Option<String>,
    /// `Some(None)` clears the avatar
    pub avatar_image: Option<Option<String>>,
}

impl UserUpdate {
    /// Merge the update into an existing record
    pub fn apply_to(&self, user: &mut User) -> Result<()> {
        if let Some(name) = &self.user_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(PlaylisterError::invalid_input(
                    "User name cannot be empty or only whitespace",
                ));
            }
            user.user_name = name.to_string();
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash.clone_from(hash);
        }
        if let Some(avatar) = &self.avatar_image {
            user.avatar_image = avatar.clone().filter(|a| !a.is_empty());
        }
        user.updated_at = Utc::now();
        Ok(())
    }
}

/// Canonical form of an email address: trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
