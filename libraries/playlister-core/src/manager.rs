//! Persistence contract implemented by every storage backend

use crate::error::Result;
use crate::types::{
    NaturalKey, NewPlaylist, NewSong, NewUser, Playlist, PlaylistId, PlaylistQuery,
    PlaylistUpdate, Song, SongId, SongSort, SongStats, SongUpdate, User, UserId, UserUpdate,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which storage engine backs a `DatabaseManager`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Embedded document store
    #[default]
    Document,
    /// SQLite
    Relational,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Document => write!(f, "document"),
            Backend::Relational => write!(f, "relational"),
        }
    }
}

impl FromStr for Backend {
    type Err = crate::PlaylisterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "doc" | "redb" => Ok(Backend::Document),
            "relational" | "sql" | "sqlite" => Ok(Backend::Relational),
            other => Err(crate::PlaylisterError::invalid_input(format!(
                "Unsupported database backend: {other}"
            ))),
        }
    }
}

/// Storage-agnostic access to users, playlists and the song catalog.
///
/// Lookups that find nothing return `Ok(None)`, `Ok(false)` or an empty list;
/// `Err` always means the operation itself failed. Implementations never leak
/// driver errors, they map them onto `PlaylisterError`.
#[async_trait]
pub trait DatabaseManager: Send + Sync {
    /// Engine behind this manager
    fn backend(&self) -> Backend;

    /// Release the underlying store
    async fn close(&self) -> Result<()>;

    // ========================================================================
    // Users
    // ========================================================================

    /// Create a user. Fails with `DuplicateKey` if the email is taken, in any case.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>>;

    /// Case-insensitive email lookup
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Merge the supplied fields. Returns `None` if the user does not exist.
    async fn update_user(&self, id: &UserId, update: UserUpdate) -> Result<Option<User>>;

    /// Delete a user and return the removed record
    async fn delete_user(&self, id: &UserId) -> Result<Option<User>>;

    // ========================================================================
    // Playlists
    // ========================================================================

    /// Create a playlist. The owner email must belong to an existing user.
    async fn create_playlist(&self, playlist: NewPlaylist) -> Result<Playlist>;

    async fn find_playlist_by_id(&self, id: &PlaylistId) -> Result<Option<Playlist>>;

    async fn find_playlists_by_owner_email(&self, email: &str) -> Result<Vec<Playlist>>;

    /// Replace the name and/or song list. Returns `None` if the playlist does not exist.
    async fn update_playlist(
        &self,
        id: &PlaylistId,
        update: PlaylistUpdate,
    ) -> Result<Option<Playlist>>;

    /// Delete a playlist and return the removed record
    async fn delete_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>>;

    async fn get_all_playlists(&self) -> Result<Vec<Playlist>>;

    /// Filter by name or owner and sort
    async fn search_playlists(&self, query: &PlaylistQuery) -> Result<Vec<Playlist>>;

    // ========================================================================
    // Song catalog
    // ========================================================================

    /// Add a song. Fails with `DuplicateEntry` on a natural-key collision.
    async fn create_song(&self, song: NewSong) -> Result<Song>;

    async fn find_song_by_id(&self, id: &SongId) -> Result<Option<Song>>;

    /// Case-insensitive lookup by title, artist and year
    async fn find_song_by_natural_key(&self, key: &NaturalKey) -> Result<Option<Song>>;

    /// Substring match on title or artist, case-insensitive
    async fn search_songs(&self, term: &str, sort: SongSort) -> Result<Vec<Song>>;

    async fn get_all_songs(&self, sort: SongSort) -> Result<Vec<Song>>;

    /// Merge the supplied fields, re-checking uniqueness if the natural key changes
    async fn update_song(&self, id: &SongId, update: SongUpdate) -> Result<Option<Song>>;

    /// Delete a song and return the removed record
    async fn delete_song(&self, id: &SongId) -> Result<Option<Song>>;

    /// Atomically add one to the listen counter and return the updated song
    async fn increment_song_listens(&self, id: &SongId) -> Result<Option<Song>>;

    async fn update_song_playlist_count(&self, id: &SongId, count: u64) -> Result<Option<Song>>;

    async fn song_exists(&self, key: &NaturalKey) -> Result<bool> {
        Ok(self.find_song_by_natural_key(key).await?.is_some())
    }

    async fn get_song_stats(&self) -> Result<SongStats>;

    // ========================================================================
    // User <-> playlist relationship
    // ========================================================================

    /// Record the playlist in the user's owned set
    async fn add_playlist_to_user(&self, user_id: &UserId, playlist_id: &PlaylistId)
        -> Result<()>;

    /// Drop the playlist from the user's owned set without deleting it.
    /// Fails with `PermissionDenied` if the user does not own it.
    async fn remove_playlist_from_user(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> Result<()>;

    /// True iff the user exists, the playlist exists, the owner email matches
    /// and the playlist is in the user's owned set
    async fn validate_user_owns_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_aliases() {
        assert_eq!("MongoDB".parse::<Backend>().ok(), None);
        assert_eq!("sqlite".parse::<Backend>().unwrap(), Backend::Relational);
        assert_eq!("document".parse::<Backend>().unwrap(), Backend::Document);
        assert_eq!(Backend::Relational.to_string(), "relational");
    }
}
