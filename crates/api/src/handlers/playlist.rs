//! Handlers for the `/playlist` resource.

use axum::extract::State;
use serde::Deserialize;
use serde_json::json;
use vidshare_core::error::CoreError;
use vidshare_core::types::DbId;
use vidshare_core::validation::{
    optional_text, require_text, DESCRIPTION_MAX_LEN, PLAYLIST_NAME_MAX_LEN,
};
use vidshare_db::models::playlist::{
    CreatePlaylist, Playlist, PlaylistDetail, PlaylistSummary, UpdatePlaylist,
};
use vidshare_db::repositories::{PlaylistRepo, UserRepo, VideoRepo};

use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path};
use crate::handlers::ensure_owner;
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

async fn owned_playlist(state: &AppState, id: DbId, auth: &AuthUser) -> AppResult<Playlist> {
    let playlist = PlaylistRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Playlist", id)))?;
    ensure_owner(playlist.owner_id, auth, "playlist")?;
    Ok(playlist)
}

async fn detail(state: &AppState, id: DbId, viewer: Option<DbId>) -> AppResult<PlaylistDetail> {
    PlaylistRepo::find_detail(&state.pool, id, viewer)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Playlist", id)))
}

/// POST /api/v1/playlist
pub async fn create_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreatePlaylistRequest>,
) -> AppResult<ApiResponse<Playlist>> {
    let name = require_text("name", &input.name, PLAYLIST_NAME_MAX_LEN)?;
    let description =
        optional_text("description", input.description.as_deref(), DESCRIPTION_MAX_LEN)?
            .unwrap_or_default();

    let playlist = PlaylistRepo::create(
        &state.pool,
        &CreatePlaylist {
            owner_id: auth.user_id,
            name,
            description,
        },
    )
    .await?;

    tracing::info!(playlist_id = playlist.id, user_id = auth.user_id, "Playlist created");
    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

/// GET /api/v1/playlist/{id}
pub async fn get_playlist(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<PlaylistDetail>> {
    let playlist = detail(&state, id, viewer.user_id()).await?;
    Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

/// GET /api/v1/playlist/user/{userId}
pub async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<ApiResponse<Vec<PlaylistSummary>>> {
    if UserRepo::find_by_id(&state.pool, user_id).await?.is_none() {
        return Err(AppError::Core(CoreError::not_found("User", user_id)));
    }
    let playlists = PlaylistRepo::list_for_owner(&state.pool, user_id).await?;
    Ok(ApiResponse::ok(playlists, "User playlists fetched successfully"))
}

/// PATCH /api/v1/playlist/{id}
pub async fn update_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePlaylistRequest>,
) -> AppResult<ApiResponse<Playlist>> {
    let name = optional_text("name", input.name.as_deref(), PLAYLIST_NAME_MAX_LEN)?;
    let description =
        optional_text("description", input.description.as_deref(), DESCRIPTION_MAX_LEN)?;
    if name.is_none() && description.is_none() {
        return Err(AppError::Core(CoreError::validation(
            "name or description is required",
        )));
    }

    owned_playlist(&state, id, &auth).await?;
    let playlist = PlaylistRepo::update(&state.pool, id, &UpdatePlaylist { name, description })
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Playlist", id)))?;

    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

/// DELETE /api/v1/playlist/{id}
pub async fn delete_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    owned_playlist(&state, id, &auth).await?;
    PlaylistRepo::delete(&state.pool, id).await?;
    tracing::info!(playlist_id = id, user_id = auth.user_id, "Playlist deleted");
    Ok(ApiResponse::ok(json!({}), "Playlist deleted successfully"))
}

/// PATCH /api/v1/playlist/add/{videoId}/{playlistId}
///
/// Adding a video that is already in the playlist changes nothing.
pub async fn add_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((video_id, playlist_id)): Path<(DbId, DbId)>,
) -> AppResult<ApiResponse<PlaylistDetail>> {
    owned_playlist(&state, playlist_id, &auth).await?;
    if !VideoRepo::is_visible(&state.pool, video_id, Some(auth.user_id)).await? {
        return Err(AppError::Core(CoreError::not_found("Video", video_id)));
    }

    let added = PlaylistRepo::add_video(&state.pool, playlist_id, video_id).await?;
    tracing::info!(playlist_id, video_id, added, "Video added to playlist");

    let message = if added {
        "Video added to playlist"
    } else {
        "Video is already in the playlist"
    };
    let playlist = detail(&state, playlist_id, Some(auth.user_id)).await?;
    Ok(ApiResponse::ok(playlist, message))
}

/// PATCH /api/v1/playlist/remove/{videoId}/{playlistId}
pub async fn remove_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((video_id, playlist_id)): Path<(DbId, DbId)>,
) -> AppResult<ApiResponse<PlaylistDetail>> {
    owned_playlist(&state, playlist_id, &auth).await?;

    if !PlaylistRepo::remove_video(&state.pool, playlist_id, video_id).await? {
        return Err(AppError::NotFound("Video is not in this playlist".into()));
    }
    tracing::info!(playlist_id, video_id, "Video removed from playlist");

    let playlist = detail(&state, playlist_id, Some(auth.user_id)).await?;
    Ok(ApiResponse::ok(playlist, "Video removed from playlist"))
}
