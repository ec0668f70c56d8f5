use axum::routing::{get, post};
use axum::Router;

use crate::handlers::likes;
use crate::state::AppState;

/// Routes mounted at `/likes`. All require auth.
///
/// ```text
/// POST /toggle/v/{videoId}    -> toggle_video_like
/// POST /toggle/c/{commentId}  -> toggle_comment_like
/// POST /toggle/p/{postId}     -> toggle_post_like
/// GET  /videos                -> liked_videos
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle/v/{video_id}", post(likes::toggle_video_like))
        .route("/toggle/c/{comment_id}", post(likes::toggle_comment_like))
        .route("/toggle/p/{post_id}", post(likes::toggle_post_like))
        .route("/videos", get(likes::liked_videos))
}
