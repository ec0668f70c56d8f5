//! Route definitions for the `/video` resource.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::video;
use crate::state::AppState;

/// Routes mounted at `/video`.
///
/// ```text
/// GET    /                      -> list_videos
/// POST   /                      -> publish_video (auth, multipart)
/// GET    /{id}                  -> get_video
/// PATCH  /{id}                  -> update_video (owner, multipart)
/// DELETE /{id}                  -> delete_video (owner)
/// PATCH  /toggle/publish/{id}   -> toggle_publish (owner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(video::list_videos).post(video::publish_video))
        .route(
            "/{id}",
            get(video::get_video)
                .patch(video::update_video)
                .delete(video::delete_video),
        )
        .route("/toggle/publish/{id}", patch(video::toggle_publish))
}
