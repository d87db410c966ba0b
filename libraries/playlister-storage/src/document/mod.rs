//! Document-store adapter backed by an embedded redb database
//!
//! Every collection is a table of JSON documents keyed by UUID. Unique
//! constraints live in index tables that are checked and written in the same
//! write transaction as the document. redb admits a single writer at a time,
//! so check-then-insert cannot race and the listen counter increment is atomic.

mod records;

use crate::error::{duplicate_email, duplicate_song, Result, StorageError};
use async_trait::async_trait;
use chrono::Utc;
use playlister_core::types::{contains_text, normalize_email, sort_songs};
use playlister_core::{
    Backend, DatabaseManager, NaturalKey, NewPlaylist, NewSong, NewUser, Playlist, PlaylistId,
    PlaylistQuery, PlaylistUpdate, PlaylisterError, Song, SongId, SongSort, SongStats,
    SongUpdate, User, UserId, UserUpdate,
};
use records::{
    all_docs, get_doc, get_index, put_doc, remove_doc, UserDocument, PLAYLISTS, SONGS,
    SONGS_NATURAL_KEY_IDX, USERS, USERS_EMAIL_IDX,
};
use redb::{Database, ReadTransaction, WriteTransaction};
use std::path::Path;
use std::sync::Arc;

/// `DatabaseManager` over an embedded document store
#[derive(Clone)]
pub struct DocumentDatabase {
    db: Arc<Database>,
}

impl DocumentDatabase {
    /// Open (or create) a store file
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or opened
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = tokio::task::spawn_blocking(move || -> Result<Database> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Connection(format!("{}: {e}", parent.display())))?;
            }
            Ok(Database::create(&path)?)
        })
        .await??;

        Self::initialize(db)
    }

    /// Volatile store, used by tests
    ///
    /// # Errors
    /// Returns an error if the tables cannot be created
    pub fn in_memory() -> Result<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::initialize(db)
    }

    /// Create every table so read transactions never see a missing one
    fn initialize(db: Database) -> Result<Self> {
        let txn = db.begin_write()?;
        txn.open_table(USERS)?;
        txn.open_table(PLAYLISTS)?;
        txn.open_table(SONGS)?;
        txn.open_table(USERS_EMAIL_IDX)?;
        txn.open_table(SONGS_NATURAL_KEY_IDX)?;
        txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    async fn read<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&ReadTransaction) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_read()?;
            op(&txn)
        })
        .await?
    }

    /// Run `op` in a write transaction, committing only if it succeeds
    async fn write<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&WriteTransaction) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_write()?;
            let value = op(&txn)?;
            txn.commit()?;
            Ok(value)
        })
        .await?
    }

    async fn all_songs(&self) -> Result<Vec<Song>> {
        self.read(|txn| all_docs(&txn.open_table(SONGS)?)).await
    }

    async fn all_playlists(&self) -> Result<Vec<Playlist>> {
        let mut playlists: Vec<Playlist> =
            self.read(|txn| all_docs(&txn.open_table(PLAYLISTS)?)).await?;
        playlists.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(playlists)
    }
}

fn owns(user: &UserDocument, playlist: &Playlist) -> bool {
    playlist.owner_email == user.email && user.playlists.contains(&playlist.id)
}

fn update_song_doc(
    txn: &WriteTransaction,
    id: &str,
    change: impl FnOnce(&mut Song),
) -> Result<Option<Song>> {
    let mut songs = txn.open_table(SONGS)?;
    let Some(mut song) = get_doc::<Song, _>(&songs, id)? else {
        return Ok(None);
    };
    change(&mut song);
    put_doc(&mut songs, id, &song)?;
    Ok(Some(song))
}

#[async_trait]
impl DatabaseManager for DocumentDatabase {
    fn backend(&self) -> Backend {
        Backend::Document
    }

    async fn close(&self) -> playlister_core::Result<()> {
        // redb flushes on every commit; the file is released when the last
        // handle drops.
        tracing::debug!("Closing document store");
        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    async fn create_user(&self, user: NewUser) -> playlister_core::Result<User> {
        let user = user.normalized()?;
        let created = self
            .write(move |txn| {
                let mut email_idx = txn.open_table(USERS_EMAIL_IDX)?;
                if get_index(&email_idx, &user.email)?.is_some() {
                    return Err(duplicate_email().into());
                }

                let now = Utc::now();
                let doc = UserDocument {
                    id: UserId::generate(),
                    user_name: user.user_name,
                    email: user.email,
                    password_hash: user.password_hash,
                    avatar_image: user.avatar_image,
                    playlists: Vec::new(),
                    created_at: now,
                    updated_at: now,
                };

                let mut users = txn.open_table(USERS)?;
                put_doc(&mut users, doc.id.as_str(), &doc)?;
                email_idx.insert(doc.email.as_str(), doc.id.as_str())?;
                Ok(doc)
            })
            .await?;

        tracing::debug!(user_id = %created.id, "Created user");
        Ok(created.into())
    }

    async fn find_user_by_id(&self, id: &UserId) -> playlister_core::Result<Option<User>> {
        let id = id.as_str().to_string();
        let doc = self
            .read(move |txn| get_doc::<UserDocument, _>(&txn.open_table(USERS)?, &id))
            .await?;
        Ok(doc.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> playlister_core::Result<Option<User>> {
        let email = normalize_email(email);
        let doc = self
            .read(move |txn| {
                let Some(id) = get_index(&txn.open_table(USERS_EMAIL_IDX)?, &email)? else {
                    return Ok(None);
                };
                get_doc::<UserDocument, _>(&txn.open_table(USERS)?, &id)
            })
            .await?;
        Ok(doc.map(User::from))
    }

    async fn update_user(
        &self,
        id: &UserId,
        update: UserUpdate,
    ) -> playlister_core::Result<Option<User>> {
        let id = id.as_str().to_string();
        let updated = self
            .write(move |txn| {
                let mut users = txn.open_table(USERS)?;
                let Some(doc) = get_doc::<UserDocument, _>(&users, &id)? else {
                    return Ok(None);
                };
                let mut user = User::from(doc);
                update.apply_to(&mut user)?;
                put_doc(&mut users, &id, &UserDocument::from(user.clone()))?;
                Ok(Some(user))
            })
            .await?;
        Ok(updated)
    }

    async fn delete_user(&self, id: &UserId) -> playlister_core::Result<Option<User>> {
        let id = id.as_str().to_string();
        let removed = self
            .write(move |txn| {
                let mut users = txn.open_table(USERS)?;
                let Some(doc) = remove_doc::<UserDocument>(&mut users, &id)? else {
                    return Ok(None);
                };
                txn.open_table(USERS_EMAIL_IDX)?.remove(doc.email.as_str())?;
                Ok(Some(doc))
            })
            .await?;
        Ok(removed.map(User::from))
    }

    // ========================================================================
    // Playlists
    // ========================================================================

    async fn create_playlist(&self, playlist: NewPlaylist) -> playlister_core::Result<Playlist> {
        let playlist = playlist.validated()?;
        let created = self
            .write(move |txn| {
                let owner_id = get_index(&txn.open_table(USERS_EMAIL_IDX)?, &playlist.owner_email)?
                    .ok_or_else(|| PlaylisterError::not_found("User", &playlist.owner_email))?;

                let now = Utc::now();
                let doc = Playlist {
                    id: PlaylistId::generate(),
                    name: playlist.name,
                    owner_email: playlist.owner_email,
                    songs: playlist.songs,
                    created_at: now,
                    updated_at: now,
                };
                put_doc(&mut txn.open_table(PLAYLISTS)?, doc.id.as_str(), &doc)?;

                // The owner reference is part of creation, same as the
                // relational user_id column.
                let mut users = txn.open_table(USERS)?;
                if let Some(mut owner) = get_doc::<UserDocument, _>(&users, &owner_id)? {
                    owner.playlists.push(doc.id.clone());
                    put_doc(&mut users, &owner_id, &owner)?;
                }
                Ok(doc)
            })
            .await?;

        tracing::debug!(playlist_id = %created.id, "Created playlist");
        Ok(created)
    }

    async fn find_playlist_by_id(
        &self,
        id: &PlaylistId,
    ) -> playlister_core::Result<Option<Playlist>> {
        let id = id.as_str().to_string();
        Ok(self
            .read(move |txn| get_doc(&txn.open_table(PLAYLISTS)?, &id))
            .await?)
    }

    async fn find_playlists_by_owner_email(
        &self,
        email: &str,
    ) -> playlister_core::Result<Vec<Playlist>> {
        let email = normalize_email(email);
        let mut playlists = self.all_playlists().await?;
        playlists.retain(|p| p.owner_email == email);
        Ok(playlists)
    }

    async fn update_playlist(
        &self,
        id: &PlaylistId,
        update: PlaylistUpdate,
    ) -> playlister_core::Result<Option<Playlist>> {
        let id = id.as_str().to_string();
        Ok(self
            .write(move |txn| {
                let mut playlists = txn.open_table(PLAYLISTS)?;
                let Some(mut playlist) = get_doc::<Playlist, _>(&playlists, &id)? else {
                    return Ok(None);
                };
                update.apply_to(&mut playlist)?;
                put_doc(&mut playlists, &id, &playlist)?;
                Ok(Some(playlist))
            })
            .await?)
    }

    async fn delete_playlist(&self, id: &PlaylistId) -> playlister_core::Result<Option<Playlist>> {
        let id = id.as_str().to_string();
        Ok(self
            .write(move |txn| {
                let Some(playlist) = remove_doc::<Playlist>(&mut txn.open_table(PLAYLISTS)?, &id)?
                else {
                    return Ok(None);
                };

                // Drop the dangling reference from the owner, if still attached
                let owner_id = get_index(&txn.open_table(USERS_EMAIL_IDX)?, &playlist.owner_email)?;
                if let Some(owner_id) = owner_id {
                    let mut users = txn.open_table(USERS)?;
                    if let Some(mut owner) = get_doc::<UserDocument, _>(&users, &owner_id)? {
                        owner.playlists.retain(|p| p != &playlist.id);
                        put_doc(&mut users, &owner_id, &owner)?;
                    }
                }
                Ok(Some(playlist))
            })
            .await?)
    }

    async fn get_all_playlists(&self) -> playlister_core::Result<Vec<Playlist>> {
        Ok(self.all_playlists().await?)
    }

    async fn search_playlists(
        &self,
        query: &PlaylistQuery,
    ) -> playlister_core::Result<Vec<Playlist>> {
        Ok(query.apply(self.all_playlists().await?))
    }

    // ========================================================================
    // Song catalog
    // ========================================================================

    async fn create_song(&self, song: NewSong) -> playlister_core::Result<Song> {
        let song = song.validated()?;
        let created = self
            .write(move |txn| {
                let key = song.natural_key();
                let normalized = key.normalized();
                let mut key_idx = txn.open_table(SONGS_NATURAL_KEY_IDX)?;
                if get_index(&key_idx, &normalized)?.is_some() {
                    return Err(duplicate_song(&key).into());
                }

                let now = Utc::now();
                let doc = Song {
                    id: SongId::generate(),
                    title: song.title,
                    artist: song.artist,
                    year: song.year,
                    you_tube_id: song.you_tube_id,
                    listens: 0,
                    playlist_count: 0,
                    created_at: now,
                    updated_at: now,
                };
                put_doc(&mut txn.open_table(SONGS)?, doc.id.as_str(), &doc)?;
                key_idx.insert(normalized.as_str(), doc.id.as_str())?;
                Ok(doc)
            })
            .await?;

        tracing::debug!(song_id = %created.id, "Created song");
        Ok(created)
    }

    async fn find_song_by_id(&self, id: &SongId) -> playlister_core::Result<Option<Song>> {
        let id = id.as_str().to_string();
        Ok(self
            .read(move |txn| get_doc(&txn.open_table(SONGS)?, &id))
            .await?)
    }

    async fn find_song_by_natural_key(
        &self,
        key: &NaturalKey,
    ) -> playlister_core::Result<Option<Song>> {
        let normalized = key.normalized();
        Ok(self
            .read(move |txn| {
                let Some(id) = get_index(&txn.open_table(SONGS_NATURAL_KEY_IDX)?, &normalized)?
                else {
                    return Ok(None);
                };
                get_doc(&txn.open_table(SONGS)?, &id)
            })
            .await?)
    }

    async fn search_songs(&self, term: &str, sort: SongSort) -> playlister_core::Result<Vec<Song>> {
        let term = term.trim();
        let mut songs = self.all_songs().await?;
        if !term.is_empty() {
            songs.retain(|s| contains_text(&s.title, term) || contains_text(&s.artist, term));
        }
        sort_songs(&mut songs, sort);
        Ok(songs)
    }

    async fn get_all_songs(&self, sort: SongSort) -> playlister_core::Result<Vec<Song>> {
        let mut songs = self.all_songs().await?;
        sort_songs(&mut songs, sort);
        Ok(songs)
    }

    async fn update_song(
        &self,
        id: &SongId,
        update: SongUpdate,
    ) -> playlister_core::Result<Option<Song>> {
        let id = id.as_str().to_string();
        Ok(self
            .write(move |txn| {
                let mut songs = txn.open_table(SONGS)?;
                let Some(mut song) = get_doc::<Song, _>(&songs, &id)? else {
                    return Ok(None);
                };

                let old_key = song.natural_key().normalized();
                update.apply_to(&mut song)?;
                let new_key = song.natural_key();
                let new_normalized = new_key.normalized();

                if new_normalized != old_key {
                    let mut key_idx = txn.open_table(SONGS_NATURAL_KEY_IDX)?;
                    if let Some(existing) = get_index(&key_idx, &new_normalized)? {
                        if existing != id {
                            return Err(duplicate_song(&new_key).into());
                        }
                    }
                    key_idx.remove(old_key.as_str())?;
                    key_idx.insert(new_normalized.as_str(), id.as_str())?;
                }

                put_doc(&mut songs, &id, &song)?;
                Ok(Some(song))
            })
            .await?)
    }

    async fn delete_song(&self, id: &SongId) -> playlister_core::Result<Option<Song>> {
        let id = id.as_str().to_string();
        Ok(self
            .write(move |txn| {
                let Some(song) = remove_doc::<Song>(&mut txn.open_table(SONGS)?, &id)? else {
                    return Ok(None);
                };
                txn.open_table(SONGS_NATURAL_KEY_IDX)?
                    .remove(song.natural_key().normalized().as_str())?;
                Ok(Some(song))
            })
            .await?)
    }

    async fn increment_song_listens(&self, id: &SongId) -> playlister_core::Result<Option<Song>> {
        let id = id.as_str().to_string();
        Ok(self
            .write(move |txn| {
                update_song_doc(txn, &id, |song| {
                    song.listens += 1;
                    song.updated_at = Utc::now();
                })
            })
            .await?)
    }

    async fn update_song_playlist_count(
        &self,
        id: &SongId,
        count: u64,
    ) -> playlister_core::Result<Option<Song>> {
        let id = id.as_str().to_string();
        Ok(self
            .write(move |txn| {
                update_song_doc(txn, &id, |song| {
                    song.playlist_count = count;
                    song.updated_at = Utc::now();
                })
            })
            .await?)
    }

    async fn get_song_stats(&self) -> playlister_core::Result<SongStats> {
        Ok(SongStats::from_songs(&self.all_songs().await?))
    }

    // ========================================================================
    // User <-> playlist relationship
    // ========================================================================

    async fn add_playlist_to_user(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> playlister_core::Result<()> {
        let user_id = user_id.as_str().to_string();
        let playlist_id = playlist_id.clone();
        self.write(move |txn| {
            let mut users = txn.open_table(USERS)?;
            let mut user = get_doc::<UserDocument, _>(&users, &user_id)?
                .ok_or_else(|| PlaylisterError::not_found("User", &user_id))?;
            let playlist = get_doc::<Playlist, _>(&txn.open_table(PLAYLISTS)?, playlist_id.as_str())?
                .ok_or_else(|| PlaylisterError::not_found("Playlist", playlist_id.as_str()))?;

            if playlist.owner_email != user.email {
                return Err(PlaylisterError::PermissionDenied.into());
            }
            if !user.playlists.contains(&playlist_id) {
                user.playlists.push(playlist_id);
                put_doc(&mut users, &user_id, &user)?;
            }
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn remove_playlist_from_user(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> playlister_core::Result<()> {
        let user_id = user_id.as_str().to_string();
        let playlist_id = playlist_id.clone();
        self.write(move |txn| {
            let mut users = txn.open_table(USERS)?;
            let mut user = get_doc::<UserDocument, _>(&users, &user_id)?
                .ok_or_else(|| PlaylisterError::not_found("User", &user_id))?;
            let playlist = get_doc::<Playlist, _>(&txn.open_table(PLAYLISTS)?, playlist_id.as_str())?
                .ok_or_else(|| PlaylisterError::not_found("Playlist", playlist_id.as_str()))?;

            if !owns(&user, &playlist) {
                return Err(PlaylisterError::PermissionDenied.into());
            }
            user.playlists.retain(|p| p != &playlist_id);
            put_doc(&mut users, &user_id, &user)?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn validate_user_owns_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> playlister_core::Result<bool> {
        let user_id = user_id.as_str().to_string();
        let playlist_id = playlist_id.as_str().to_string();
        Ok(self
            .read(move |txn| {
                let Some(playlist) = get_doc::<Playlist, _>(&txn.open_table(PLAYLISTS)?, &playlist_id)?
                else {
                    return Ok(false);
                };
                let Some(user) = get_doc::<UserDocument, _>(&txn.open_table(USERS)?, &user_id)?
                else {
                    return Ok(false);
                };
                Ok(owns(&user, &playlist))
            })
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_starts_empty() {
        let db = DocumentDatabase::in_memory().unwrap();
        assert!(db.get_all_playlists().await.unwrap().is_empty());
        assert_eq!(db.get_song_stats().await.unwrap().total_songs, 0);
        assert_eq!(db.backend(), Backend::Document);
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_state() {
        let db = DocumentDatabase::in_memory().unwrap();
        let playlist = NewPlaylist {
            name: "Orphan".to_string(),
            owner_email: "nobody@example.com".to_string(),
            songs: vec![],
        };

        let err = db.create_playlist(playlist).await.unwrap_err();
        assert!(matches!(err, PlaylisterError::NotFound { .. }));
        assert!(db.get_all_playlists().await.unwrap().is_empty());
    }
}
