/// Catalog song domain types
use crate::error::{PlaylisterError, Result};
use crate::types::sort::{compare_text, SongSort, SongSortKey};
use crate::types::SongId;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Oldest release year accepted into the catalog
pub const MIN_SONG_YEAR: i32 = 1900;

/// Catalog entry, distinct from the song copies embedded in playlists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    #[serde(rename = "_id")]
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub you_tube_id: String,
    /// Times the song was played, only ever incremented
    pub listens: u64,
    /// Cached number of playlists containing the song
    pub playlist_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Song {
    /// Natural key of this song
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(&self.title, &self.artist, self.year)
    }

    /// Ascending comparison on the given key, ties broken by title then id
    pub fn compare_by(&self, other: &Self, key: SongSortKey) -> Ordering {
        let primary = match key {
            SongSortKey::Title => compare_text(&self.title, &other.title),
            SongSortKey::Artist => compare_text(&self.artist, &other.artist),
            SongSortKey::Year => self.year.cmp(&other.year),
            SongSortKey::Listens => self.listens.cmp(&other.listens),
            SongSortKey::PlaylistCount => self.playlist_count.cmp(&other.playlist_count),
        };
        primary
            .then_with(|| compare_text(&self.title, &other.title))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sort a list of songs in place
pub fn sort_songs(songs: &mut [Song], sort: SongSort) {
    songs.sort_by(|a, b| sort.order.apply(a.compare_by(b, sort.key)));
}

/// Input for adding a song to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub you_tube_id: String,
}

impl NewSong {
    /// Trim every text field and check the year range
    pub fn validated(self) -> Result<Self> {
        let song = Self {
            title: self.title.trim().to_string(),
            artist: self.artist.trim().to_string(),
            year: self.year,
            you_tube_id: self.you_tube_id.trim().to_string(),
        };
        if song.title.is_empty() || song.artist.is_empty() || song.you_tube_id.is_empty() {
            return Err(PlaylisterError::invalid_input(
                "Title, artist, year, and YouTube ID are required",
            ));
        }
        validate_year(song.year)?;
        Ok(song)
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(&self.title, &self.artist, self.year)
    }
}

/// Partial update of a catalog song
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongUpdate {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub you_tube_id: Option<String>,
}

impl SongUpdate {
    /// True if the update touches title, artist or year
    pub fn changes_natural_key(&self) -> bool {
        self.title.is_some() || self.artist.is_some() || self.year.is_some()
    }

    /// Merge into an existing song, validating the result
    pub fn apply_to(&self, song: &mut Song) -> Result<()> {
        let merged = NewSong {
            title: self.title.clone().unwrap_or_else(|| song.title.clone()),
            artist: self.artist.clone().unwrap_or_else(|| song.artist.clone()),
            year: self.year.unwrap_or(song.year),
            you_tube_id: self
                .you_tube_id
                .clone()
                .unwrap_or_else(|| song.you_tube_id.clone()),
        }
        .validated()?;

        song.title = merged.title;
        song.artist = merged.artist;
        song.year = merged.year;
        song.you_tube_id = merged.you_tube_id;
        song.updated_at = Utc::now();
        Ok(())
    }
}

/// The (title, artist, year) triple that identifies a catalog song
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub title: String,
    pub artist: String,
    pub year: i32,
}

impl NaturalKey {
    pub fn new(title: &str, artist: &str, year: i32) -> Self {
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            year,
        }
    }

    /// Canonical string used by unique indexes in both stores.
    ///
    /// Trimmed, lowercased, joined with the ASCII unit separator which cannot
    /// appear in user-typed text.
    pub fn normalized(&self) -> String {
        format!(
            "{}\u{1f}{}\u{1f}{}",
            self.title.trim().to_lowercase(),
            self.artist.trim().to_lowercase(),
            self.year
        )
    }

    pub fn matches(&self, other: &NaturalKey) -> bool {
        self.normalized() == other.normalized()
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" by {} ({})", self.title, self.artist, self.year)
    }
}

/// Aggregate catalog statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongStats {
    pub total_songs: u64,
    pub most_listened: Option<Song>,
    pub most_in_playlists: Option<Song>,
}

impl SongStats {
    /// Build stats from the full catalog
    pub fn from_songs(songs: &[Song]) -> Self {
        Self {
            total_songs: songs.len() as u64,
            most_listened: top_by(songs, SongSortKey::Listens),
            most_in_playlists: top_by(songs, SongSortKey::PlaylistCount),
        }
    }
}

fn top_by(songs: &[Song], key: SongSortKey) -> Option<Song> {
    // Highest value wins; on a tie the alphabetically first title is reported.
    songs
        .iter()
        .min_by(|a, b| {
            let value = |s: &Song| match key {
                SongSortKey::Listens => s.listens,
                _ => s.playlist_count,
            };
            value(b)
                .cmp(&value(a))
                .then_with(|| compare_text(&a.title, &b.title))
                .then_with(|| a.id.cmp(&b.id))
        })
        .cloned()
}

/// Accept release years from `MIN_SONG_YEAR` through next year
pub fn validate_year(year: i32) -> Result<()> {
    let max = Utc::now().year() + 1;
    if (MIN_SONG_YEAR..=max).contains(&year) {
        Ok(())
    } else {
        Err(PlaylisterError::invalid_input(format!(
            "Year must be between {MIN_SONG_YEAR} and {max}"
        )))
    }
}
