//! Relational adapter over SQLite
//!
//! Query functions live in one module per table and take the pool
//! explicitly; [`RelationalDatabase`] wires them into `DatabaseManager`.

mod playlists;
mod rows;
mod songs;
mod users;

use async_trait::async_trait;
use playlister_core::types::normalize_email;
use playlister_core::{
    Backend, DatabaseManager, NaturalKey, NewPlaylist, NewSong, NewUser, Playlist, PlaylistId,
    PlaylistQuery, PlaylistUpdate, Result, Song, SongId, SongSort, SongStats, SongUpdate, User,
    UserId, UserUpdate,
};
use sqlx::{Sqlite, SqlitePool, Transaction};

/// `DatabaseManager` over a migrated SQLite pool
#[derive(Clone)]
pub struct RelationalDatabase {
    pool: SqlitePool,
}

impl RelationalDatabase {
    /// Wrap a pool whose schema is already migrated
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Open a transaction that holds the write lock from its first statement.
///
/// A deferred transaction that reads and then writes cannot wait for a
/// concurrent writer in WAL mode; it fails with SQLITE_BUSY at the upgrade.
/// `BEGIN IMMEDIATE` takes the lock up front, so contention is absorbed by the
/// pool's busy timeout instead.
async fn begin_write(pool: &SqlitePool) -> crate::Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

#[async_trait]
impl DatabaseManager for RelationalDatabase {
    fn backend(&self) -> Backend {
        Backend::Relational
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!("Closing SQLite pool");
        self.pool.close().await;
        Ok(())
    }

    // User operations

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = users::create(&self.pool, user).await?;
        tracing::debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>> {
        Ok(users::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(users::find_by_email(&self.pool, &normalize_email(email)).await?)
    }

    async fn update_user(&self, id: &UserId, update: UserUpdate) -> Result<Option<User>> {
        Ok(users::update(&self.pool, id, update).await?)
    }

    async fn delete_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(users::delete(&self.pool, id).await?)
    }

    // Playlist operations

    async fn create_playlist(&self, playlist: NewPlaylist) -> Result<Playlist> {
        let playlist = playlists::create(&self.pool, playlist).await?;
        tracing::debug!(playlist_id = %playlist.id, "Created playlist");
        Ok(playlist)
    }

    async fn find_playlist_by_id(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        Ok(playlists::find_by_id(&self.pool, id).await?)
    }

    async fn find_playlists_by_owner_email(&self, email: &str) -> Result<Vec<Playlist>> {
        Ok(playlists::find_by_owner_email(&self.pool, &normalize_email(email)).await?)
    }

    async fn update_playlist(
        &self,
        id: &PlaylistId,
        update: PlaylistUpdate,
    ) -> Result<Option<Playlist>> {
        Ok(playlists::update(&self.pool, id, update).await?)
    }

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        Ok(playlists::delete(&self.pool, id).await?)
    }

    async fn get_all_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(playlists::get_all(&self.pool).await?)
    }

    async fn search_playlists(&self, query: &PlaylistQuery) -> Result<Vec<Playlist>> {
        Ok(playlists::search(&self.pool, query).await?)
    }

    // Song catalog operations

    async fn create_song(&self, song: NewSong) -> Result<Song> {
        let song = songs::create(&self.pool, song).await?;
        tracing::debug!(song_id = %song.id, "Created song");
        Ok(song)
    }

    async fn find_song_by_id(&self, id: &SongId) -> Result<Option<Song>> {
        Ok(songs::find_by_id(&self.pool, id).await?)
    }

    async fn find_song_by_natural_key(&self, key: &NaturalKey) -> Result<Option<Song>> {
        Ok(songs::find_by_natural_key(&self.pool, key).await?)
    }

    async fn search_songs(&self, term: &str, sort: SongSort) -> Result<Vec<Song>> {
        Ok(songs::search(&self.pool, term, sort).await?)
    }

    async fn get_all_songs(&self, sort: SongSort) -> Result<Vec<Song>> {
        Ok(songs::get_all(&self.pool, sort).await?)
    }

    async fn update_song(&self, id: &SongId, update: SongUpdate) -> Result<Option<Song>> {
        Ok(songs::update(&self.pool, id, update).await?)
    }

    async fn delete_song(&self, id: &SongId) -> Result<Option<Song>> {
        Ok(songs::delete(&self.pool, id).await?)
    }

    async fn increment_song_listens(&self, id: &SongId) -> Result<Option<Song>> {
        Ok(songs::increment_listens(&self.pool, id).await?)
    }

    async fn update_song_playlist_count(&self, id: &SongId, count: u64) -> Result<Option<Song>> {
        Ok(songs::set_playlist_count(&self.pool, id, count).await?)
    }

    async fn get_song_stats(&self) -> Result<SongStats> {
        Ok(songs::stats(&self.pool).await?)
    }

    // User <-> playlist relationship

    async fn add_playlist_to_user(&self, user_id: &UserId, playlist_id: &PlaylistId) -> Result<()> {
        Ok(playlists::attach(&self.pool, user_id, playlist_id).await?)
    }

    async fn remove_playlist_from_user(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> Result<()> {
        Ok(playlists::detach(&self.pool, user_id, playlist_id).await?)
    }

    async fn validate_user_owns_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> Result<bool> {
        Ok(playlists::is_owned_by(&self.pool, user_id, playlist_id).await?)
    }
}
