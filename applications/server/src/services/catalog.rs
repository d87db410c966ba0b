/// Keeps the catalog's cached `playlistCount` in step with playlist contents
use playlister_core::{DatabaseManager, NaturalKey, PlaylistSong, Result};
use std::collections::BTreeMap;

/// Recompute `playlistCount` for every catalog song among `songs`.
///
/// `songs` should hold both the previous and the new entries of the playlist
/// that changed, so songs that were removed are recounted too. Entries with no
/// catalog counterpart are skipped.
pub async fn sync_playlist_counts<'a>(
    db: &dyn DatabaseManager,
    songs: impl IntoIterator<Item = &'a PlaylistSong>,
) -> Result<()> {
    let keys: BTreeMap<String, NaturalKey> = songs
        .into_iter()
        .map(|song| {
            let key = song.natural_key();
            (key.normalized(), key)
        })
        .collect();
    if keys.is_empty() {
        return Ok(());
    }

    let playlists = db.get_all_playlists().await?;

    for key in keys.values() {
        let Some(song) = db.find_song_by_natural_key(key).await? else {
            continue;
        };
        let count = playlists.iter().filter(|p| p.contains_song(key)).count() as u64;
        if count != song.playlist_count {
            db.update_song_playlist_count(&song.id, count).await?;
            tracing::debug!(song_id = %song.id, count, "Updated playlist count");
        }
    }

    Ok(())
}
