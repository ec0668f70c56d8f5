//! Channel posts, optionally carrying a poll.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::json;
use vidshare_core::error::CoreError;
use vidshare_core::types::DbId;
use vidshare_core::validation::{normalize_poll_options, require_text, POST_MAX_LEN};
use vidshare_db::models::post::{CreatePost, PollOptionTally, Post, PostWithStats};
use vidshare_db::repositories::{PostRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path};
use crate::handlers::ensure_owner;
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    /// Poll option labels. Absent or empty means a plain post.
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    /// Zero-based option index.
    pub option: i32,
}

/// A post together with its poll options.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: Post,
    pub options: Vec<PollOptionTally>,
}

/// Current tallies after a vote.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub post_id: DbId,
    pub options: Vec<PollOptionTally>,
    pub my_vote: i32,
}

async fn find_post(state: &AppState, id: DbId) -> AppResult<Post> {
    PostRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Post", id)))
}

async fn options_of(state: &AppState, post_id: DbId) -> AppResult<Vec<PollOptionTally>> {
    let mut tallies = PostRepo::tallies(&state.pool, &[post_id]).await?;
    Ok(tallies.remove(&post_id).unwrap_or_default())
}

/// POST /api/v1/posts
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreatePostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let content = require_text("content", &input.content, POST_MAX_LEN)?;
    let options = match input.options.as_deref() {
        None | Some([]) => Vec::new(),
        Some(raw) => normalize_poll_options(raw)?,
    };

    let post = PostRepo::create(
        &state.pool,
        &CreatePost {
            owner_id: auth.user_id,
            content,
            options,
        },
    )
    .await?;
    let options = options_of(&state, post.id).await?;

    tracing::info!(
        post_id = post.id,
        user_id = auth.user_id,
        options = options.len(),
        "Post created",
    );
    Ok(ApiResponse::created(
        PostResponse { post, options },
        "Post created successfully",
    ))
}

/// GET /api/v1/posts/user/{userId}
pub async fn user_posts(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(user_id): Path<DbId>,
) -> AppResult<ApiResponse<Vec<PostWithStats>>> {
    if UserRepo::find_by_id(&state.pool, user_id).await?.is_none() {
        return Err(AppError::Core(CoreError::not_found("User", user_id)));
    }
    let posts = PostRepo::list_for_owner(&state.pool, user_id, viewer.user_id()).await?;
    Ok(ApiResponse::ok(posts, "User posts fetched successfully"))
}

/// PATCH /api/v1/posts/{id}
///
/// Only the text changes; poll options are fixed once created.
pub async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePostRequest>,
) -> AppResult<ApiResponse<Post>> {
    let content = require_text("content", &input.content, POST_MAX_LEN)?;
    let post = find_post(&state, id).await?;
    ensure_owner(post.owner_id, &auth, "post")?;

    let post = PostRepo::update_content(&state.pool, id, &content)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Post", id)))?;
    Ok(ApiResponse::ok(post, "Post updated successfully"))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let post = find_post(&state, id).await?;
    ensure_owner(post.owner_id, &auth, "post")?;
    PostRepo::delete(&state.pool, id).await?;
    tracing::info!(post_id = id, user_id = auth.user_id, "Post deleted");
    Ok(ApiResponse::ok(json!({}), "Post deleted successfully"))
}

/// POST /api/v1/posts/{id}/vote
///
/// Voting again moves the caller's single vote to the new option.
pub async fn vote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<VoteRequest>,
) -> AppResult<ApiResponse<VoteResult>> {
    find_post(&state, id).await?;

    let option_count = PostRepo::option_count(&state.pool, id).await?;
    if option_count == 0 {
        return Err(AppError::Core(CoreError::validation(
            "This post has no poll to vote on",
        )));
    }
    if input.option < 0 || i64::from(input.option) >= option_count {
        return Err(AppError::Core(CoreError::validation(format!(
            "option must be between 0 and {}",
            option_count - 1
        ))));
    }

    PostRepo::vote(&state.pool, id, auth.user_id, input.option).await?;
    tracing::debug!(post_id = id, user_id = auth.user_id, option = input.option, "Vote recorded");

    let options = options_of(&state, id).await?;
    Ok(ApiResponse::ok(
        VoteResult {
            post_id: id,
            options,
            my_vote: input.option,
        },
        "Vote recorded",
    ))
}
