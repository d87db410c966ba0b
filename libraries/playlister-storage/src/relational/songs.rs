//! Song catalog queries

use super::rows::{like_pattern, song_from_row, to_millis, SONG_COLUMNS};
use crate::error::{duplicate_song, Result, StorageError};
use chrono::Utc;
use playlister_core::types::SongSortKey;
use playlister_core::{NaturalKey, NewSong, Song, SongId, SongSort, SongStats, SongUpdate};
use sqlx::{Row, SqlitePool};

/// `ORDER BY` clause matching `Song::compare_by`: key, then title, then id
fn order_clause(sort: SongSort) -> String {
    let column = match sort.key {
        SongSortKey::Title => "title COLLATE NOCASE",
        SongSortKey::Artist => "artist COLLATE NOCASE",
        SongSortKey::Year => "year",
        SongSortKey::Listens => "listens",
        SongSortKey::PlaylistCount => "playlist_count",
    };
    let dir = sort.order.as_sql();
    format!("ORDER BY {column} {dir}, title COLLATE NOCASE {dir}, id {dir}")
}

pub async fn create(pool: &SqlitePool, song: NewSong) -> Result<Song> {
    let song = song.validated()?;
    let key = song.natural_key();
    let now = to_millis(Utc::now());

    let row = sqlx::query(&format!(
        "INSERT INTO songs (title, artist, year, you_tube_id, natural_key, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING {SONG_COLUMNS}"
    ))
    .bind(&song.title)
    .bind(&song.artist)
    .bind(song.year)
    .bind(&song.you_tube_id)
    .bind(key.normalized())
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| StorageError::from_sqlx(e, || duplicate_song(&key)))?;

    song_from_row(&row)
}

pub async fn find_by_id(pool: &SqlitePool, id: &SongId) -> Result<Option<Song>> {
    let Some(id) = id.as_i64() else {
        return Ok(None);
    };
    let row = sqlx::query(&format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(song_from_row).transpose()
}

pub async fn find_by_natural_key(pool: &SqlitePool, key: &NaturalKey) -> Result<Option<Song>> {
    let row = sqlx::query(&format!("SELECT {SONG_COLUMNS} FROM songs WHERE natural_key = ?"))
        .bind(key.normalized())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(song_from_row).transpose()
}

/// Case-insensitive substring search over title and artist
pub async fn search(pool: &SqlitePool, term: &str, sort: SongSort) -> Result<Vec<Song>> {
    let term = term.trim();
    if term.is_empty() {
        return get_all(pool, sort).await;
    }

    let pattern = like_pattern(term);
    let rows = sqlx::query(&format!(
        "SELECT {SONG_COLUMNS} FROM songs
         WHERE title LIKE ? ESCAPE '\\' OR artist LIKE ? ESCAPE '\\'
         {}",
        order_clause(sort)
    ))
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    rows.iter().map(song_from_row).collect()
}

pub async fn get_all(pool: &SqlitePool, sort: SongSort) -> Result<Vec<Song>> {
    let rows = sqlx::query(&format!(
        "SELECT {SONG_COLUMNS} FROM songs {}",
        order_clause(sort)
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(song_from_row).collect()
}

/// Apply a partial update; a changed natural key is re-checked by the
/// UNIQUE constraint on `natural_key`
pub async fn update(pool: &SqlitePool, id: &SongId, update: SongUpdate) -> Result<Option<Song>> {
    let Some(row_id) = id.as_i64() else {
        return Ok(None);
    };
    let mut tx = super::begin_write(pool).await?;

    let row = sqlx::query(&format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?"))
        .bind(row_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(mut song) = row.as_ref().map(song_from_row).transpose()? else {
        return Ok(None);
    };

    update.apply_to(&mut song)?;
    let key = song.natural_key();

    sqlx::query(
        "UPDATE songs
         SET title = ?, artist = ?, year = ?, you_tube_id = ?, natural_key = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&song.title)
    .bind(&song.artist)
    .bind(song.year)
    .bind(&song.you_tube_id)
    .bind(key.normalized())
    .bind(to_millis(song.updated_at))
    .bind(row_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| StorageError::from_sqlx(e, || duplicate_song(&key)))?;

    tx.commit().await?;
    Ok(Some(song))
}

pub async fn delete(pool: &SqlitePool, id: &SongId) -> Result<Option<Song>> {
    let Some(id) = id.as_i64() else {
        return Ok(None);
    };
    let row = sqlx::query(&format!("DELETE FROM songs WHERE id = ? RETURNING {SONG_COLUMNS}"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(song_from_row).transpose()
}

/// Atomic `listens = listens + 1`, evaluated by the engine
pub async fn increment_listens(pool: &SqlitePool, id: &SongId) -> Result<Option<Song>> {
    let Some(id) = id.as_i64() else {
        return Ok(None);
    };
    let row = sqlx::query(&format!(
        "UPDATE songs SET listens = listens + 1, updated_at = ? WHERE id = ?
         RETURNING {SONG_COLUMNS}"
    ))
    .bind(to_millis(Utc::now()))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(song_from_row).transpose()
}

pub async fn set_playlist_count(pool: &SqlitePool, id: &SongId, count: u64) -> Result<Option<Song>> {
    let Some(id) = id.as_i64() else {
        return Ok(None);
    };
    let row = sqlx::query(&format!(
        "UPDATE songs SET playlist_count = ?, updated_at = ? WHERE id = ?
         RETURNING {SONG_COLUMNS}"
    ))
    .bind(count as i64)
    .bind(to_millis(Utc::now()))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(song_from_row).transpose()
}

/// Total count plus the top song by listens and by playlist count.
///
/// Ties resolve to the alphabetically first title, then the lowest id.
pub async fn stats(pool: &SqlitePool) -> Result<SongStats> {
    let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM songs")
        .fetch_one(pool)
        .await?
        .try_get("total")?;

    let top = |column: &str| {
        format!(
            "SELECT {SONG_COLUMNS} FROM songs
             ORDER BY {column} DESC, title COLLATE NOCASE ASC, id ASC
             LIMIT 1"
        )
    };

    let most_listened = sqlx::query(&top("listens"))
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(song_from_row)
        .transpose()?;
    let most_in_playlists = sqlx::query(&top("playlist_count"))
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(song_from_row)
        .transpose()?;

    Ok(SongStats {
        total_songs: total as u64,
        most_listened,
        most_in_playlists,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use playlister_core::types::SortOrder;

    #[test]
    fn order_clause_applies_direction_to_every_tiebreaker() {
        let clause = order_clause(SongSort::new(SongSortKey::Listens, SortOrder::Desc));
        assert_eq!(
            clause,
            "ORDER BY listens DESC, title COLLATE NOCASE DESC, id DESC"
        );
    }

    #[test]
    fn text_keys_sort_case_insensitively() {
        let clause = order_clause(SongSort::new(SongSortKey::Artist, SortOrder::Asc));
        assert!(clause.starts_with("ORDER BY artist COLLATE NOCASE ASC"));
    }
}
