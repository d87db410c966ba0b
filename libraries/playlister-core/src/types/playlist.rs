/// Playlist domain types
use crate::error::{PlaylisterError, Result};
use crate::types::sort::{compare_text, contains_text, PlaylistSearchField, PlaylistSortKey, SortOrder};
use crate::types::{NaturalKey, PlaylistId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Song entry embedded in a playlist. A copy, not a catalog reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSong {
    pub title: String,
    pub artist: String,
    pub year: i32,
    #[serde(default)]
    pub you_tube_id: String,
}

impl PlaylistSong {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(&self.title, &self.artist, self.year)
    }
}

/// Playlist owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: PlaylistId,
    pub name: String,
    /// Owner's email, denormalized from the user record
    pub owner_email: String,
    pub songs: Vec<PlaylistSong>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    /// Ascending comparison on the given key, ties broken by id
    pub fn compare_by(&self, other: &Self, key: PlaylistSortKey) -> Ordering {
        let primary = match key {
            PlaylistSortKey::Name => compare_text(&self.name, &other.name),
            PlaylistSortKey::OwnerEmail => compare_text(&self.owner_email, &other.owner_email),
            PlaylistSortKey::CreatedAt => self.created_at.cmp(&other.created_at),
            PlaylistSortKey::UpdatedAt => self.updated_at.cmp(&other.updated_at),
        };
        primary.then_with(|| self.id.cmp(&other.id))
    }

    /// True if any embedded entry carries this natural key
    pub fn contains_song(&self, key: &NaturalKey) -> bool {
        self.songs.iter().any(|s| s.natural_key().matches(key))
    }
}

/// Input for creating a playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist {
    pub name: String,
    pub owner_email: String,
    pub songs: Vec<PlaylistSong>,
}

impl NewPlaylist {
    pub fn validated(self) -> Result<Self> {
        if self.name.trim().is_empty() {
            return Err(PlaylisterError::invalid_input("Playlist name is required"));
        }
        Ok(Self {
            name: self.name,
            owner_email: crate::types::normalize_email(&self.owner_email),
            songs: self.songs,
        })
    }
}

/// Partial update of a playlist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistUpdate {
    pub name: Option<String>,
    pub songs: Option<Vec<PlaylistSong>>,
}

impl PlaylistUpdate {
    pub fn apply_to(&self, playlist: &mut Playlist) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(PlaylisterError::invalid_input("Playlist name is required"));
            }
            playlist.name.clone_from(name);
        }
        if let Some(songs) = &self.songs {
            playlist.songs.clone_from(songs);
        }
        playlist.updated_at = Utc::now();
        Ok(())
    }
}

/// Search/sort request for playlists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistQuery {
    /// Substring matched case-insensitively against `search_by`
    pub term: Option<String>,
    pub search_by: PlaylistSearchField,
    /// Restrict to one owner (exact, case-insensitive)
    pub owner_email: Option<String>,
    pub sort_by: PlaylistSortKey,
    pub order: SortOrder,
}

impl PlaylistQuery {
    /// The search term, if it has any non-blank content
    pub fn effective_term(&self) -> Option<&str> {
        self.term.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Whether a playlist passes the filters of this query
    pub fn matches(&self, playlist: &Playlist) -> bool {
        if let Some(owner) = &self.owner_email {
            if crate::types::normalize_email(owner) != playlist.owner_email {
                return false;
            }
        }
        match self.effective_term() {
            None => true,
            Some(term) => match self.search_by {
                PlaylistSearchField::Name => contains_text(&playlist.name, term),
                PlaylistSearchField::User => contains_text(&playlist.owner_email, term),
            },
        }
    }

    /// Filter and sort in process, for stores without a query language
    pub fn apply(&self, playlists: Vec<Playlist>) -> Vec<Playlist> {
        let mut matching: Vec<Playlist> = playlists.into_iter().filter(|p| self.matches(p)).collect();
        matching.sort_by(|a, b| self.order.apply(a.compare_by(b, self.sort_by)));
        matching
    }
}
