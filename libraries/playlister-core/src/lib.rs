//! Playlister Core
//!
//! Storage-agnostic domain types, validation and the persistence contract.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `User`, `Playlist`, `Song` and their create/update inputs
//! - **Core Trait**: `DatabaseManager`, implemented once per storage engine
//! - **Error Handling**: Unified `PlaylisterError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use playlister_core::types::{NaturalKey, SongSort, SongSortKey, SortOrder};
//!
//! let key = NaturalKey::new("Hey Jude", "The Beatles", 1968);
//! assert!(key.matches(&NaturalKey::new("hey jude", "the beatles", 1968)));
//!
//! let sort = SongSort::new(SongSortKey::Listens, SortOrder::Desc);
//! assert_eq!(sort.order.as_sql(), "DESC");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod manager;
pub mod types;

pub use error::{PlaylisterError, Result};
pub use manager::{Backend, DatabaseManager};

pub use types::{
    NaturalKey, NewPlaylist, NewSong, NewUser, Playlist, PlaylistId, PlaylistQuery, PlaylistSong,
    PlaylistUpdate, Song, SongId, SongSort, SongStats, SongUpdate, User, UserId, UserUpdate,
};
