//! Row <-> domain mapping for the SQLite schema

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use playlister_core::{Playlist, PlaylistId, PlaylistSong, Song, SongId, User, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub(super) const USER_COLUMNS: &str =
    "id, user_name, email, password_hash, avatar_image, created_at, updated_at";

pub(super) const PLAYLIST_COLUMNS: &str = "id, name, owner_email, songs, created_at, updated_at";

pub(super) const SONG_COLUMNS: &str =
    "id, title, artist, year, you_tube_id, listens, playlist_count, created_at, updated_at";

/// Timestamps are stored as Unix milliseconds
pub(super) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let ms: i64 = row.try_get(column)?;
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StorageError::Corrupt(format!("{column} out of range: {ms}")))
}

/// Map a users row; the owned playlist ids come from a separate query
pub(super) fn user_from_row(row: &SqliteRow, playlists: Vec<PlaylistId>) -> Result<User> {
    Ok(User {
        id: UserId::from(row.try_get::<i64, _>("id")?),
        user_name: row.try_get("user_name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        avatar_image: row.try_get("avatar_image")?,
        playlists,
        created_at: from_millis(row, "created_at")?,
        updated_at: from_millis(row, "updated_at")?,
    })
}

pub(super) fn playlist_from_row(row: &SqliteRow) -> Result<Playlist> {
    let songs: String = row.try_get("songs")?;
    let songs: Vec<PlaylistSong> = serde_json::from_str(&songs)?;

    Ok(Playlist {
        id: PlaylistId::from(row.try_get::<i64, _>("id")?),
        name: row.try_get("name")?,
        owner_email: row.try_get("owner_email")?,
        songs,
        created_at: from_millis(row, "created_at")?,
        updated_at: from_millis(row, "updated_at")?,
    })
}

pub(super) fn song_from_row(row: &SqliteRow) -> Result<Song> {
    Ok(Song {
        id: SongId::from(row.try_get::<i64, _>("id")?),
        title: row.try_get("title")?,
        artist: row.try_get("artist")?,
        year: row.try_get("year")?,
        you_tube_id: row.try_get("you_tube_id")?,
        listens: row.try_get::<i64, _>("listens")? as u64,
        playlist_count: row.try_get::<i64, _>("playlist_count")? as u64,
        created_at: from_millis(row, "created_at")?,
        updated_at: from_millis(row, "updated_at")?,
    })
}

/// `LIKE` pattern matching `term` anywhere, with wildcards in the term escaped.
/// Use together with `ESCAPE '\'`.
pub(super) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
