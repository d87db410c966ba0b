//! Table layout and document encoding for the redb store

use crate::error::Result;
use chrono::{DateTime, Utc};
use playlister_core::{PlaylistId, User, UserId};
use redb::{ReadableTable, Table, TableDefinition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// id -> JSON user document
pub(super) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
/// id -> JSON playlist document
pub(super) const PLAYLISTS: TableDefinition<&str, &[u8]> = TableDefinition::new("playlists");
/// id -> JSON song document
pub(super) const SONGS: TableDefinition<&str, &[u8]> = TableDefinition::new("songs");
/// normalized email -> user id
pub(super) const USERS_EMAIL_IDX: TableDefinition<&str, &str> =
    TableDefinition::new("users_email_idx");
/// normalized natural key -> song id
pub(super) const SONGS_NATURAL_KEY_IDX: TableDefinition<&str, &str> =
    TableDefinition::new("songs_natural_key_idx");

/// Stored form of a user. Unlike `User` it carries serde derives, so the
/// password hash only ever serializes into the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserDocument {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub avatar_image: Option<String>,
    #[serde(default)]
    pub playlists: Vec<PlaylistId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        User {
            id: doc.id,
            user_name: doc.user_name,
            email: doc.email,
            password_hash: doc.password_hash,
            avatar_image: doc.avatar_image,
            playlists: doc.playlists,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

impl From<User> for UserDocument {
    fn from(user: User) -> Self {
        UserDocument {
            id: user.id,
            user_name: user.user_name,
            email: user.email,
            password_hash: user.password_hash,
            avatar_image: user.avatar_image,
            playlists: user.playlists,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

pub(super) fn get_doc<T, Tbl>(table: &Tbl, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
        None => Ok(None),
    }
}

pub(super) fn all_docs<T, Tbl>(table: &Tbl) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    let mut docs = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        docs.push(serde_json::from_slice(value.value())?);
    }
    Ok(docs)
}

pub(super) fn put_doc<T: Serialize>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    doc: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(doc)?;
    table.insert(key, bytes.as_slice())?;
    Ok(())
}

pub(super) fn remove_doc<T: DeserializeOwned>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
) -> Result<Option<T>> {
    match table.remove(key)? {
        Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
        None => Ok(None),
    }
}

pub(super) fn get_index<Tbl>(table: &Tbl, key: &str) -> Result<Option<String>>
where
    Tbl: ReadableTable<&'static str, &'static str>,
{
    Ok(table.get(key)?.map(|guard| guard.value().to_string()))
}
