/// Song catalog API routes
///
/// Browsing, stats, existence checks and listen counting are public; adding,
/// editing and removing songs require a session.
use crate::{
    error::{Result, ServerError},
    extract::{Json, Query},
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use playlister_core::{NaturalKey, NewSong, Song, SongId, SongSort, SongUpdate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Clients send the year as a number or as a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YearInput {
    Number(i64),
    Text(String),
}

impl YearInput {
    fn parse(&self) -> Result<i32> {
        let year = match self {
            YearInput::Number(n) => i32::try_from(*n).ok(),
            YearInput::Text(s) => s.trim().parse().ok(),
        };
        year.ok_or_else(|| ServerError::BadRequest("Year must be a whole number".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRequest {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<YearInput>,
    pub you_tube_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExistsParams {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SongResponse {
    pub success: bool,
    pub song: Song,
}

impl SongResponse {
    fn new(song: Song) -> Json<Self> {
        Json(Self {
            success: true,
            song,
        })
    }
}

fn song_not_found() -> ServerError {
    ServerError::NotFound("Song not found".to_string())
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /songs?search&sortBy&sortOrder
pub async fn list_songs(
    State(app_state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>> {
    let sort = SongSort::parse(params.sort_by.as_deref(), params.sort_order.as_deref())?;
    let term = params.search.unwrap_or_default();

    let songs = app_state.db.search_songs(&term, sort).await?;
    Ok(Json(json!({ "success": true, "songs": songs })))
}

/// GET /songs/stats
pub async fn song_stats(State(app_state): State<AppState>) -> Result<Json<Value>> {
    let stats = app_state.db.get_song_stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// GET /songs/check/exists?title&artist&year
pub async fn song_exists(
    State(app_state): State<AppState>,
    Query(params): Query<ExistsParams>,
) -> Result<Json<Value>> {
    let (Some(title), Some(artist), Some(year)) = (
        present(params.title),
        present(params.artist),
        present(params.year),
    ) else {
        return Err(ServerError::BadRequest(
            "Title, artist, and year are required".to_string(),
        ));
    };
    let year = YearInput::Text(year).parse()?;

    let exists = app_state
        .db
        .song_exists(&NaturalKey::new(&title, &artist, year))
        .await?;
    Ok(Json(json!({ "success": true, "exists": exists })))
}

/// GET /songs/:id
pub async fn get_song(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SongResponse>> {
    let song = app_state
        .db
        .find_song_by_id(&SongId::new(id))
        .await?
        .ok_or_else(song_not_found)?;

    Ok(SongResponse::new(song))
}

/// POST /songs
pub async fn create_song(
    State(app_state): State<AppState>,
    session: AuthenticatedUser,
    Json(req): Json<SongRequest>,
) -> Result<(StatusCode, Json<SongResponse>)> {
    let (Some(title), Some(artist), Some(year), Some(you_tube_id)) = (
        present(req.title),
        present(req.artist),
        req.year,
        present(req.you_tube_id),
    ) else {
        return Err(ServerError::BadRequest(
            "Title, artist, year, and YouTube ID are required".to_string(),
        ));
    };

    let song = app_state
        .db
        .create_song(NewSong {
            title,
            artist,
            year: year.parse()?,
            you_tube_id,
        })
        .await?;

    tracing::info!(song_id = %song.id, user_id = %session.user_id(), "Added song to catalog");
    Ok((StatusCode::CREATED, SongResponse::new(song)))
}

/// PUT /songs/:id
pub async fn update_song(
    State(app_state): State<AppState>,
    _session: AuthenticatedUser,
    Path(id): Path<String>,
    Json(req): Json<SongRequest>,
) -> Result<Json<SongResponse>> {
    let update = SongUpdate {
        title: req.title,
        artist: req.artist,
        year: req.year.as_ref().map(YearInput::parse).transpose()?,
        you_tube_id: req.you_tube_id,
    };

    let song = app_state
        .db
        .update_song(&SongId::new(id), update)
        .await?
        .ok_or_else(song_not_found)?;

    Ok(SongResponse::new(song))
}

/// DELETE /songs/:id
pub async fn delete_song(
    State(app_state): State<AppState>,
    session: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let song = app_state
        .db
        .delete_song(&SongId::new(id))
        .await?
        .ok_or_else(song_not_found)?;

    tracing::info!(song_id = %song.id, user_id = %session.user_id(), "Removed song from catalog");
    Ok(Json(json!({
        "success": true,
        "message": "Song deleted successfully",
    })))
}

/// POST /songs/:id/listen
pub async fn increment_listens(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SongResponse>> {
    let song = app_state
        .db
        .increment_song_listens(&SongId::new(id))
        .await?
        .ok_or_else(song_not_found)?;

    Ok(SongResponse::new(song))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_accepts_numbers_and_numeric_strings() {
        let body: SongRequest =
            serde_json::from_str(r#"{"title":"X","artist":"Y","year":"2000","youTubeId":"z"}"#)
                .unwrap();
        assert_eq!(body.year.unwrap().parse().unwrap(), 2000);

        assert_eq!(YearInput::Number(1999).parse().unwrap(), 1999);
        assert!(YearInput::Text("soon".to_string()).parse().is_err());
        assert!(YearInput::Number(i64::MAX).parse().is_err());
    }
}
