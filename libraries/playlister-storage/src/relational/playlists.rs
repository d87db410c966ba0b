//! Playlist queries and the user <-> playlist relationship

use super::rows::{like_pattern, playlist_from_row, to_millis, PLAYLIST_COLUMNS};
use crate::error::Result;
use chrono::Utc;
use playlister_core::types::{normalize_email, PlaylistSearchField, PlaylistSortKey};
use playlister_core::{
    NewPlaylist, Playlist, PlaylistId, PlaylistQuery, PlaylistUpdate, PlaylisterError, UserId,
};
use sqlx::{Row, SqliteConnection, SqlitePool};

async fn fetch(conn: &mut SqliteConnection, id: i64) -> Result<Option<Playlist>> {
    let row = sqlx::query(&format!("SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(playlist_from_row).transpose()
}

/// Insert a playlist attached to the user registered under `owner_email`
pub async fn create(pool: &SqlitePool, playlist: NewPlaylist) -> Result<Playlist> {
    let playlist = playlist.validated()?;
    let songs = serde_json::to_string(&playlist.songs)?;
    let now = to_millis(Utc::now());
    let mut tx = super::begin_write(pool).await?;

    let owner_id: i64 = sqlx::query("SELECT id FROM users WHERE email = ?")
        .bind(&playlist.owner_email)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.try_get("id"))
        .transpose()?
        .ok_or_else(|| PlaylisterError::not_found("User", &playlist.owner_email))?;

    let row = sqlx::query(&format!(
        "INSERT INTO playlists (name, owner_email, user_id, songs, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING {PLAYLIST_COLUMNS}"
    ))
    .bind(&playlist.name)
    .bind(&playlist.owner_email)
    .bind(owner_id)
    .bind(&songs)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    let created = playlist_from_row(&row)?;

    tx.commit().await?;
    Ok(created)
}

pub async fn find_by_id(pool: &SqlitePool, id: &PlaylistId) -> Result<Option<Playlist>> {
    let Some(id) = id.as_i64() else {
        return Ok(None);
    };
    let mut conn = pool.acquire().await?;
    fetch(&mut conn, id).await
}

pub async fn find_by_owner_email(pool: &SqlitePool, email: &str) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE owner_email = ? ORDER BY created_at, id"
    ))
    .bind(email)
    .fetch_all(pool)
    .await?;

    rows.iter().map(playlist_from_row).collect()
}

pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(playlist_from_row).collect()
}

/// Filter by owner and search term, ordered by the requested key
pub async fn search(pool: &SqlitePool, query: &PlaylistQuery) -> Result<Vec<Playlist>> {
    let mut sql = format!("SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE 1 = 1");
    let owner = query.owner_email.as_deref().map(normalize_email);
    let pattern = query.effective_term().map(like_pattern);

    if owner.is_some() {
        sql.push_str(" AND owner_email = ?");
    }
    if pattern.is_some() {
        let column = match query.search_by {
            PlaylistSearchField::Name => "name",
            PlaylistSearchField::User => "owner_email",
        };
        sql.push_str(&format!(" AND {column} LIKE ? ESCAPE '\\'"));
    }

    let column = match query.sort_by {
        PlaylistSortKey::Name => "name COLLATE NOCASE",
        PlaylistSortKey::OwnerEmail => "owner_email COLLATE NOCASE",
        PlaylistSortKey::CreatedAt => "created_at",
        PlaylistSortKey::UpdatedAt => "updated_at",
    };
    let dir = query.order.as_sql();
    sql.push_str(&format!(" ORDER BY {column} {dir}, id {dir}"));

    let mut q = sqlx::query(&sql);
    if let Some(owner) = &owner {
        q = q.bind(owner);
    }
    if let Some(pattern) = &pattern {
        q = q.bind(pattern);
    }

    let rows = q.fetch_all(pool).await?;
    rows.iter().map(playlist_from_row).collect()
}

pub async fn update(
    pool: &SqlitePool,
    id: &PlaylistId,
    update: PlaylistUpdate,
) -> Result<Option<Playlist>> {
    let Some(id) = id.as_i64() else {
        return Ok(None);
    };
    let mut tx = super::begin_write(pool).await?;

    let Some(mut playlist) = fetch(&mut tx, id).await? else {
        return Ok(None);
    };
    update.apply_to(&mut playlist)?;

    sqlx::query("UPDATE playlists SET name = ?, songs = ?, updated_at = ? WHERE id = ?")
        .bind(&playlist.name)
        .bind(serde_json::to_string(&playlist.songs)?)
        .bind(to_millis(playlist.updated_at))
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(playlist))
}

pub async fn delete(pool: &SqlitePool, id: &PlaylistId) -> Result<Option<Playlist>> {
    let Some(id) = id.as_i64() else {
        return Ok(None);
    };
    let mut tx = super::begin_write(pool).await?;

    let Some(playlist) = fetch(&mut tx, id).await? else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(playlist))
}

/// Owner email and attached user id of a playlist, if it exists
async fn ownership(conn: &mut SqliteConnection, playlist_id: i64) -> Result<Option<(String, Option<i64>)>> {
    let row = sqlx::query("SELECT owner_email, user_id FROM playlists WHERE id = ?")
        .bind(playlist_id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(Some((row.try_get("owner_email")?, row.try_get("user_id")?))),
        None => Ok(None),
    }
}

async fn user_email(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<String>> {
    let row = sqlx::query("SELECT email FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|row| row.try_get("email")).transpose()?)
}

/// Resolve both sides of the relationship or fail with `NotFound`
async fn relationship(
    conn: &mut SqliteConnection,
    user_id: &UserId,
    playlist_id: &PlaylistId,
) -> Result<(i64, String, i64, String, Option<i64>)> {
    let user_not_found = || PlaylisterError::not_found("User", user_id.as_str());
    let playlist_not_found = || PlaylisterError::not_found("Playlist", playlist_id.as_str());

    let uid = user_id.as_i64().ok_or_else(user_not_found)?;
    let pid = playlist_id.as_i64().ok_or_else(playlist_not_found)?;
    let email = user_email(conn, uid).await?.ok_or_else(user_not_found)?;
    let (owner_email, attached) = ownership(conn, pid).await?.ok_or_else(playlist_not_found)?;

    Ok((uid, email, pid, owner_email, attached))
}

/// Attach a playlist to its owner. Idempotent.
pub async fn attach(pool: &SqlitePool, user_id: &UserId, playlist_id: &PlaylistId) -> Result<()> {
    let mut tx = super::begin_write(pool).await?;
    let (uid, email, pid, owner_email, _) = relationship(&mut tx, user_id, playlist_id).await?;

    if owner_email != email {
        return Err(PlaylisterError::PermissionDenied.into());
    }
    sqlx::query("UPDATE playlists SET user_id = ? WHERE id = ?")
        .bind(uid)
        .bind(pid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Detach a playlist from its owner without deleting it
pub async fn detach(pool: &SqlitePool, user_id: &UserId, playlist_id: &PlaylistId) -> Result<()> {
    let mut tx = super::begin_write(pool).await?;
    let (uid, email, pid, owner_email, attached) =
        relationship(&mut tx, user_id, playlist_id).await?;

    if owner_email != email || attached != Some(uid) {
        return Err(PlaylisterError::PermissionDenied.into());
    }
    sqlx::query("UPDATE playlists SET user_id = NULL WHERE id = ?")
        .bind(pid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Owner email matches and the playlist is attached to this user
pub async fn is_owned_by(
    pool: &SqlitePool,
    user_id: &UserId,
    playlist_id: &PlaylistId,
) -> Result<bool> {
    let (Some(uid), Some(pid)) = (user_id.as_i64(), playlist_id.as_i64()) else {
        return Ok(false);
    };

    let owned = sqlx::query(
        "SELECT 1 FROM playlists p JOIN users u ON u.id = p.user_id
         WHERE p.id = ? AND u.id = ? AND p.owner_email = u.email",
    )
    .bind(pid)
    .bind(uid)
    .fetch_optional(pool)
    .await?;

    Ok(owned.is_some())
}
