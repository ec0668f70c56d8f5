pub mod comment;
pub mod health;
pub mod likes;
pub mod playlist;
pub mod posts;
pub mod subscriptions;
pub mod users;
pub mod video;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /users/...            registration, sessions, profile, channel, history
/// /video/...            listing, upload, detail, edit, delete, publish toggle
/// /comment/...          comments under a video
/// /likes/...            like toggles, liked videos
/// /subscriptions/...    subscribe toggle, subscriber and channel lists
/// /playlist/...         playlists and membership
/// /posts/...            channel posts and poll votes
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/video", video::router())
        .nest("/comment", comment::router())
        .nest("/likes", likes::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/playlist", playlist::router())
        .nest("/posts", posts::router())
}
