mod ids;
mod playlist;
mod song;
mod sort;
mod user;

pub use ids::{PlaylistId, SongId, UserId};
pub use playlist::{NewPlaylist, Playlist, PlaylistQuery, PlaylistSong, PlaylistUpdate};
pub use song::{
    sort_songs, validate_year, NaturalKey, NewSong, Song, SongStats, SongUpdate, MIN_SONG_YEAR,
};
pub use sort::{
    compare_text, contains_text, PlaylistSearchField, PlaylistSortKey, SongSort, SongSortKey,
    SortOrder,
};
pub use user::{normalize_email, NewUser, User, UserUpdate};
