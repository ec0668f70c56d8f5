//! Handlers for the `/comment` resource.

use axum::extract::State;
use serde::Deserialize;
use serde_json::json;
use vidshare_core::error::CoreError;
use vidshare_core::listing::Page;
use vidshare_core::types::DbId;
use vidshare_core::validation::{require_text, COMMENT_MAX_LEN};
use vidshare_db::models::comment::{Comment, CommentWithOwner};
use vidshare_db::repositories::{CommentRepo, VideoRepo};

use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path, Query};
use crate::handlers::{ensure_owner, PageQuery};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Request body for creating or editing a comment.
#[derive(Debug, Deserialize)]
pub struct CommentInput {
    pub content: String,
}

async fn ensure_video_visible(state: &AppState, video_id: DbId, viewer: Option<DbId>) -> AppResult<()> {
    if !VideoRepo::is_visible(&state.pool, video_id, viewer).await? {
        return Err(AppError::Core(CoreError::not_found("Video", video_id)));
    }
    Ok(())
}

async fn owned_comment(state: &AppState, id: DbId, auth: &AuthUser) -> AppResult<Comment> {
    let comment = CommentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Comment", id)))?;
    ensure_owner(comment.owner_id, auth, "comment")?;
    Ok(comment)
}

/// GET /api/v1/comment/{videoId}
pub async fn list_comments(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(video_id): Path<DbId>,
    Query(params): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<CommentWithOwner>>> {
    ensure_video_visible(&state, video_id, viewer.user_id()).await?;
    let page = CommentRepo::list_for_video(&state.pool, video_id, params.request()).await?;
    Ok(ApiResponse::ok(page, "Comments fetched successfully"))
}

/// POST /api/v1/comment/{videoId}
pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<DbId>,
    Json(input): Json<CommentInput>,
) -> AppResult<ApiResponse<Comment>> {
    let content = require_text("content", &input.content, COMMENT_MAX_LEN)?;
    ensure_video_visible(&state, video_id, Some(auth.user_id)).await?;

    let comment = CommentRepo::create(&state.pool, video_id, auth.user_id, &content).await?;
    tracing::info!(comment_id = comment.id, video_id, user_id = auth.user_id, "Comment added");
    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

/// PATCH /api/v1/comment/c/{commentId}
pub async fn update_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_id): Path<DbId>,
    Json(input): Json<CommentInput>,
) -> AppResult<ApiResponse<Comment>> {
    let content = require_text("content", &input.content, COMMENT_MAX_LEN)?;
    owned_comment(&state, comment_id, &auth).await?;

    let comment = CommentRepo::update_content(&state.pool, comment_id, &content)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Comment", comment_id)))?;
    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

/// DELETE /api/v1/comment/c/{commentId}
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_id): Path<DbId>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    owned_comment(&state, comment_id, &auth).await?;
    CommentRepo::delete(&state.pool, comment_id).await?;
    tracing::info!(comment_id, user_id = auth.user_id, "Comment deleted");
    Ok(ApiResponse::ok(json!({}), "Comment deleted successfully"))
}
