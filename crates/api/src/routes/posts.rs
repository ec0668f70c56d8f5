use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::posts;
use crate::state::AppState;

/// Routes mounted at `/posts`.
///
/// ```text
/// POST   /                -> create_post (auth)
/// GET    /user/{userId}   -> user_posts
/// PATCH  /{id}            -> update_post (owner)
/// DELETE /{id}            -> delete_post (owner)
/// POST   /{id}/vote       -> vote (auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(posts::create_post))
        .route("/user/{user_id}", get(posts::user_posts))
        .route("/{id}", patch(posts::update_post).delete(posts::delete_post))
        .route("/{id}/vote", post(posts::vote))
}
