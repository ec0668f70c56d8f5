//! Like toggles for videos, comments and posts.

use axum::extract::State;
use serde::Serialize;
use vidshare_core::error::CoreError;
use vidshare_core::types::DbId;
use vidshare_db::models::like::LikeTarget;
use vidshare_db::models::video::VideoSummary;
use vidshare_db::repositories::{CommentRepo, LikeRepo, PostRepo, VideoRepo};

use crate::error::{AppError, AppResult};
use crate::extract::Path;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub is_liked: bool,
}

async fn target_exists(state: &AppState, target: LikeTarget, viewer: DbId) -> AppResult<bool> {
    Ok(match target {
        LikeTarget::Video(id) => VideoRepo::is_visible(&state.pool, id, Some(viewer)).await?,
        LikeTarget::Comment(id) => CommentRepo::find_by_id(&state.pool, id).await?.is_some(),
        LikeTarget::Post(id) => PostRepo::find_by_id(&state.pool, id).await?.is_some(),
    })
}

async fn toggle(
    state: &AppState,
    auth: &AuthUser,
    target: LikeTarget,
) -> AppResult<ApiResponse<LikeStatus>> {
    if !target_exists(state, target, auth.user_id).await? {
        return Err(AppError::Core(CoreError::not_found(
            target.entity(),
            target.id(),
        )));
    }

    let is_liked = LikeRepo::toggle(&state.pool, target, auth.user_id).await?;
    tracing::debug!(
        user_id = auth.user_id,
        target = target.entity(),
        target_id = target.id(),
        is_liked,
        "Like toggled",
    );

    let message = if is_liked { "Liked" } else { "Like removed" };
    Ok(ApiResponse::ok(LikeStatus { is_liked }, message))
}

/// POST /api/v1/likes/toggle/v/{videoId}
pub async fn toggle_video_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<DbId>,
) -> AppResult<ApiResponse<LikeStatus>> {
    toggle(&state, &auth, LikeTarget::Video(video_id)).await
}

/// POST /api/v1/likes/toggle/c/{commentId}
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_id): Path<DbId>,
) -> AppResult<ApiResponse<LikeStatus>> {
    toggle(&state, &auth, LikeTarget::Comment(comment_id)).await
}

/// POST /api/v1/likes/toggle/p/{postId}
pub async fn toggle_post_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<DbId>,
) -> AppResult<ApiResponse<LikeStatus>> {
    toggle(&state, &auth, LikeTarget::Post(post_id)).await
}

/// GET /api/v1/likes/videos
pub async fn liked_videos(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<ApiResponse<Vec<VideoSummary>>> {
    let videos = LikeRepo::liked_videos(&state.pool, auth.user_id).await?;
    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
