//! Route definitions for the `/playlist` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::playlist;
use crate::state::AppState;

/// Routes mounted at `/playlist`.
///
/// ```text
/// POST   /                              -> create_playlist (auth)
/// GET    /{id}                          -> get_playlist
/// PATCH  /{id}                          -> update_playlist (owner)
/// DELETE /{id}                          -> delete_playlist (owner)
/// PATCH  /add/{videoId}/{playlistId}    -> add_video (owner)
/// PATCH  /remove/{videoId}/{playlistId} -> remove_video (owner)
/// GET    /user/{userId}                 -> user_playlists
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(playlist::create_playlist))
        .route(
            "/{id}",
            get(playlist::get_playlist)
                .patch(playlist::update_playlist)
                .delete(playlist::delete_playlist),
        )
        .route("/add/{video_id}/{playlist_id}", patch(playlist::add_video))
        .route("/remove/{video_id}/{playlist_id}", patch(playlist::remove_video))
        .route("/user/{user_id}", get(playlist::user_playlists))
}
