//! Route definitions for the `/users` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// POST  /register          -> register (multipart)
/// POST  /login             -> login
/// POST  /logout            -> logout (auth)
/// POST  /refresh-token     -> refresh_token
/// POST  /change-password   -> change_password (auth)
/// GET   /current-user      -> current_user (auth)
/// PATCH /update-account    -> update_account (auth)
/// PATCH /avatar            -> update_avatar (auth, multipart)
/// PATCH /cover-image       -> update_cover_image (auth, multipart)
/// GET   /c/{username}      -> channel_profile
/// GET   /history           -> watch_history (auth)
/// GET   /dashboard         -> dashboard (auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .route("/refresh-token", post(users::refresh_token))
        .route("/change-password", post(users::change_password))
        .route("/current-user", get(users::current_user))
        .route("/update-account", patch(users::update_account))
        .route("/avatar", patch(users::update_avatar))
        .route("/cover-image", patch(users::update_cover_image))
        .route("/c/{username}", get(users::channel_profile))
        .route("/history", get(users::watch_history))
        .route("/dashboard", get(users::dashboard))
}
