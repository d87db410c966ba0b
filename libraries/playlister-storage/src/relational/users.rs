//! User account queries

use super::rows::{to_millis, user_from_row, USER_COLUMNS};
use crate::error::{duplicate_email, Result, StorageError};
use chrono::Utc;
use playlister_core::{NewUser, PlaylistId, User, UserId, UserUpdate};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Ids of the playlists whose `user_id` points at this user
async fn owned_playlist_ids(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<PlaylistId>> {
    let rows = sqlx::query("SELECT id FROM playlists WHERE user_id = ? ORDER BY created_at, id")
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| Ok(PlaylistId::from(row.try_get::<i64, _>("id")?)))
        .collect()
}

async fn hydrate(conn: &mut SqliteConnection, row: Option<SqliteRow>) -> Result<Option<User>> {
    let Some(row) = row else {
        return Ok(None);
    };
    let id: i64 = row.try_get("id")?;
    let playlists = owned_playlist_ids(conn, id).await?;
    Ok(Some(user_from_row(&row, playlists)?))
}

/// Insert a new user
///
/// The UNIQUE constraint on `email` rejects duplicates; the email is stored
/// lowercased so the constraint is case-insensitive in effect.
pub async fn create(pool: &SqlitePool, user: NewUser) -> Result<User> {
    let user = user.normalized()?;
    let now = Utc::now();

    let row = sqlx::query(&format!(
        "INSERT INTO users (user_name, email, password_hash, avatar_image, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&user.user_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.avatar_image)
    .bind(to_millis(now))
    .bind(to_millis(now))
    .fetch_one(pool)
    .await
    .map_err(|e| StorageError::from_sqlx(e, duplicate_email))?;

    user_from_row(&row, Vec::new())
}

pub async fn find_by_id(pool: &SqlitePool, id: &UserId) -> Result<Option<User>> {
    let Some(id) = id.as_i64() else {
        return Ok(None);
    };
    let mut conn = pool.acquire().await?;

    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    hydrate(&mut conn, row).await
}

/// Look up by an already-normalized email
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let mut conn = pool.acquire().await?;

    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

    hydrate(&mut conn, row).await
}

/// Merge a partial update; email is never touched
pub async fn update(pool: &SqlitePool, id: &UserId, update: UserUpdate) -> Result<Option<User>> {
    let Some(id) = id.as_i64() else {
        return Ok(None);
    };
    let mut tx = super::begin_write(pool).await?;

    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(mut user) = hydrate(&mut tx, row).await? else {
        return Ok(None);
    };

    update.apply_to(&mut user)?;

    sqlx::query(
        "UPDATE users SET user_name = ?, password_hash = ?, avatar_image = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&user.user_name)
    .bind(&user.password_hash)
    .bind(&user.avatar_image)
    .bind(to_millis(user.updated_at))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(user))
}

/// Delete a user; their playlists stay, detached by `ON DELETE SET NULL`
pub async fn delete(pool: &SqlitePool, id: &UserId) -> Result<Option<User>> {
    let Some(id) = id.as_i64() else {
        return Ok(None);
    };
    let mut tx = super::begin_write(pool).await?;

    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(user) = hydrate(&mut tx, row).await? else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(user))
}
