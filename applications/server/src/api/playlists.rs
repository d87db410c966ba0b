/// Playlist store API routes
///
/// Every route requires a session. Mutations resolve the session user first
/// and check ownership before touching data.
use crate::{
    error::{Result, ServerError},
    extract::{Json, Query},
    middleware::CurrentUser,
    services::catalog,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use playlister_core::{
    NewPlaylist, Playlist, PlaylistId, PlaylistQuery, PlaylistSong, PlaylistUpdate, User,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub songs: Vec<PlaylistSong>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistFields {
    pub name: Option<String>,
    pub songs: Option<Vec<PlaylistSong>>,
}

/// Update body: the fields directly, or nested under `playlist`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UpdatePlaylistRequest {
    Nested { playlist: PlaylistFields },
    Flat(PlaylistFields),
}

impl From<UpdatePlaylistRequest> for PlaylistUpdate {
    fn from(req: UpdatePlaylistRequest) -> Self {
        let (UpdatePlaylistRequest::Nested { playlist: fields }
        | UpdatePlaylistRequest::Flat(fields)) = req;
        PlaylistUpdate {
            name: fields.name,
            songs: fields.songs,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub search: Option<String>,
    pub search_by: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub owner: Option<String>,
}

impl SearchParams {
    fn into_query(self) -> Result<PlaylistQuery> {
        Ok(PlaylistQuery {
            term: self.search,
            search_by: self.search_by.as_deref().unwrap_or_default().parse()?,
            owner_email: self.owner.filter(|o| !o.trim().is_empty()),
            sort_by: self.sort_by.as_deref().unwrap_or_default().parse()?,
            order: self.sort_order.as_deref().unwrap_or_default().parse()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct IdNamePair {
    #[serde(rename = "_id")]
    pub id: PlaylistId,
    pub name: String,
}

/// Load a playlist the session user owns.
///
/// `missing` decides how an absent playlist is reported, since the read and
/// write routes differ.
async fn owned_playlist(
    app_state: &AppState,
    user: &User,
    id: &PlaylistId,
    missing: fn() -> ServerError,
) -> Result<Playlist> {
    let playlist = app_state.db.find_playlist_by_id(id).await?.ok_or_else(missing)?;

    if !app_state.db.validate_user_owns_playlist(&user.id, id).await? {
        tracing::warn!(user_id = %user.id, playlist_id = %id, "Rejected non-owner access");
        return Err(ServerError::NotOwner);
    }
    Ok(playlist)
}

/// Recount catalog songs touched by a playlist change. The playlist change is
/// already committed, so a failure here is logged rather than returned.
async fn sync_counts(app_state: &AppState, before: &[PlaylistSong], after: &[PlaylistSong]) {
    if let Err(e) =
        catalog::sync_playlist_counts(app_state.db.as_ref(), before.iter().chain(after)).await
    {
        tracing::error!("Failed to update catalog playlist counts: {}", e);
    }
}

/// POST /store/playlist
pub async fn create_playlist(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let name = req
        .name
        .ok_or_else(|| ServerError::BadRequest("You must provide a playlist name".to_string()))?;

    let playlist = app_state
        .db
        .create_playlist(NewPlaylist {
            name,
            owner_email: user.email.clone(),
            songs: req.songs,
        })
        .await?;
    app_state
        .db
        .add_playlist_to_user(&user.id, &playlist.id)
        .await?;

    sync_counts(&app_state, &[], &playlist.songs).await;
    tracing::info!(playlist_id = %playlist.id, user_id = %user.id, "Created playlist");

    Ok((StatusCode::CREATED, Json(json!({ "playlist": playlist }))))
}

/// GET /store/playlist/:id
pub async fn get_playlist(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let playlist = owned_playlist(&app_state, &user, &PlaylistId::new(id), || {
        ServerError::BadRequest("Playlist not found".to_string())
    })
    .await?;

    Ok(Json(json!({ "success": true, "playlist": playlist })))
}

/// PUT /store/playlist/:id
pub async fn update_playlist(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> Result<Json<Value>> {
    let id = PlaylistId::new(id);
    let before = owned_playlist(&app_state, &user, &id, || {
        ServerError::NotFound("Playlist not found!".to_string())
    })
    .await?;

    let updated = app_state
        .db
        .update_playlist(&id, req.into())
        .await?
        .ok_or_else(|| ServerError::NotFound("Playlist not found!".to_string()))?;

    sync_counts(&app_state, &before.songs, &updated.songs).await;

    Ok(Json(json!({
        "success": true,
        "id": updated.id,
        "message": "Playlist updated!",
    })))
}

/// DELETE /store/playlist/:id
pub async fn delete_playlist(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = PlaylistId::new(id);
    let playlist = owned_playlist(&app_state, &user, &id, || {
        ServerError::NotFound("Playlist not found!".to_string())
    })
    .await?;

    // Deleting also drops the owner's reference, in one store operation
    app_state.db.delete_playlist(&id).await?;

    sync_counts(&app_state, &playlist.songs, &[]).await;
    tracing::info!(playlist_id = %id, user_id = %user.id, "Deleted playlist");

    Ok(Json(json!({})))
}

/// GET /store/playlistpairs
pub async fn playlist_pairs(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let playlists = app_state.db.find_playlists_by_owner_email(&user.email).await?;
    if playlists.is_empty() {
        return Err(ServerError::NotFound("Playlists not found".to_string()));
    }

    let pairs: Vec<IdNamePair> = playlists
        .into_iter()
        .map(|p| IdNamePair {
            id: p.id,
            name: p.name,
        })
        .collect();

    Ok(Json(json!({ "success": true, "idNamePairs": pairs })))
}

/// GET /store/playlists?search&searchBy&sortBy&sortOrder&owner
pub async fn search_playlists(
    State(app_state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>> {
    let query = params.into_query()?;
    let playlists = app_state.db.search_playlists(&query).await?;

    Ok(Json(json!({ "success": true, "data": playlists })))
}
