//! Route definitions for the `/comment` resource.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::comment;
use crate::state::AppState;

/// Routes mounted at `/comment`.
///
/// ```text
/// GET    /{videoId}      -> list_comments
/// POST   /{videoId}      -> add_comment (auth)
/// PATCH  /c/{commentId}  -> update_comment (owner)
/// DELETE /c/{commentId}  -> delete_comment (owner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{video_id}",
            get(comment::list_comments).post(comment::add_comment),
        )
        .route(
            "/c/{comment_id}",
            patch(comment::update_comment).delete(comment::delete_comment),
        )
}
