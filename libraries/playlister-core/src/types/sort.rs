/// Sorting and search options shared by the catalog and playlist queries
use crate::error::PlaylisterError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Apply the direction to an ascending comparison
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = PlaylisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(PlaylisterError::invalid_input(format!(
                "Unknown sort order: {other}"
            ))),
        }
    }
}

/// Sortable catalog fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SongSortKey {
    #[default]
    Title,
    Artist,
    Year,
    Listens,
    PlaylistCount,
}

impl FromStr for SongSortKey {
    type Err = PlaylisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "title" => Ok(SongSortKey::Title),
            "artist" => Ok(SongSortKey::Artist),
            "year" => Ok(SongSortKey::Year),
            "listens" => Ok(SongSortKey::Listens),
            "playlistCount" | "playlist_count" => Ok(SongSortKey::PlaylistCount),
            other => Err(PlaylisterError::invalid_input(format!(
                "Unknown song sort key: {other}"
            ))),
        }
    }
}

/// Catalog sort: key plus direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SongSort {
    pub key: SongSortKey,
    pub order: SortOrder,
}

impl SongSort {
    pub fn new(key: SongSortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Parse the `sortBy` / `sortOrder` query pair
    pub fn parse(key: Option<&str>, order: Option<&str>) -> crate::Result<Self> {
        Ok(Self {
            key: key.map(str::parse).transpose()?.unwrap_or_default(),
            order: order.map(str::parse).transpose()?.unwrap_or_default(),
        })
    }
}

/// Sortable playlist fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaylistSortKey {
    #[default]
    Name,
    OwnerEmail,
    CreatedAt,
    UpdatedAt,
}

impl FromStr for PlaylistSortKey {
    type Err = PlaylisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "name" => Ok(PlaylistSortKey::Name),
            "ownerEmail" | "owner_email" | "user" => Ok(PlaylistSortKey::OwnerEmail),
            "createdAt" | "created_at" => Ok(PlaylistSortKey::CreatedAt),
            "updatedAt" | "updated_at" => Ok(PlaylistSortKey::UpdatedAt),
            other => Err(PlaylisterError::invalid_input(format!(
                "Unknown playlist sort key: {other}"
            ))),
        }
    }
}

/// Which playlist field a search term is matched against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistSearchField {
    #[default]
    Name,
    /// Owner email
    User,
}

impl FromStr for PlaylistSearchField {
    type Err = PlaylisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "name" => Ok(PlaylistSearchField::Name),
            "user" => Ok(PlaylistSearchField::User),
            other => Err(PlaylisterError::invalid_input(format!(
                "Unknown playlist search field: {other}"
            ))),
        }
    }
}

/// Case-insensitive text comparison.
///
/// Folds ASCII only so the in-process sort agrees with SQLite's `NOCASE`.
/// Natural keys fold full Unicode instead, see [`crate::NaturalKey`].
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())
}

/// Case-insensitive substring match, ASCII folding like SQLite `LIKE`
pub fn contains_text(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_sort_keys() {
        let sort = SongSort::parse(Some("playlistCount"), Some("desc")).unwrap();
        assert_eq!(sort.key, SongSortKey::PlaylistCount);
        assert_eq!(sort.order, SortOrder::Desc);

        let sort = SongSort::parse(None, None).unwrap();
        assert_eq!(sort, SongSort::default());
    }

    #[test]
    fn rejects_unknown_sort_key() {
        assert!(SongSort::parse(Some("password"), None).is_err());
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn text_helpers_ignore_case() {
        assert_eq!(compare_text("abc", "ABC"), Ordering::Equal);
        assert!(contains_text("Bohemian Rhapsody", "RHAP"));
        assert!(!contains_text("Bohemian Rhapsody", "queen"));
    }

    #[test]
    fn text_helpers_fold_ascii_only() {
        assert!(contains_text("Björk", "BJ"));
        assert!(!contains_text("BJÖRK", "ö"));
        assert_ne!(compare_text("é", "É"), Ordering::Equal);
    }
}
