//! Handlers for the `/video` resource.

use axum::extract::{Multipart, State};
use serde_json::json;
use vidshare_core::error::CoreError;
use vidshare_core::listing::{Page, VideoListFilter, VideoListParams};
use vidshare_core::types::DbId;
use vidshare_core::validation::{
    optional_text, require_text, DESCRIPTION_MAX_LEN, TITLE_MAX_LEN,
};
use vidshare_db::models::video::{CreateVideo, UpdateVideo, Video, VideoDetail, VideoSummary};
use vidshare_db::repositories::{UserRepo, VideoRepo};
use vidshare_media::{discard, upload_staged, ResourceKind};

use crate::error::{AppError, AppResult};
use crate::extract::{Path, Query};
use crate::handlers::{ensure_owner, upload_required};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::upload::MultipartForm;

/// Load a video row for a mutation by `auth`, enforcing ownership.
async fn owned_video(state: &AppState, id: DbId, auth: &AuthUser) -> AppResult<Video> {
    let video = VideoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Video", id)))?;
    ensure_owner(video.owner_id, auth, "video")?;
    Ok(video)
}

/// GET /api/v1/video
///
/// Query: `page`, `limit`, `query`, `userId`, `sortBy`, `sortType`.
pub async fn list_videos(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Query(params): Query<VideoListParams>,
) -> AppResult<ApiResponse<Page<VideoSummary>>> {
    let filter = VideoListFilter::from_params(&params, viewer.user_id())?;
    let page = VideoRepo::list(&state.pool, &filter).await?;
    Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

/// POST /api/v1/video
///
/// Multipart: files `videoFile` and `thumbnail`, text `title`,
/// `description` and optional `isPublished`.
pub async fn publish_video(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<Video>> {
    let mut form =
        MultipartForm::collect(&mut multipart, &state.stager, &["videoFile", "thumbnail"]).await?;

    let title = require_text("title", form.text("title").unwrap_or_default(), TITLE_MAX_LEN)?;
    let description = require_text(
        "description",
        form.text("description").unwrap_or_default(),
        DESCRIPTION_MAX_LEN,
    )?;
    let is_published = form.flag("isPublished")?.unwrap_or(false);

    for field in ["videoFile", "thumbnail"] {
        if !form.has_file(field) {
            return Err(AppError::Core(CoreError::validation(format!(
                "{field} file is required"
            ))));
        }
    }

    let video_file =
        upload_required(&state, form.take_file("videoFile"), ResourceKind::Video, "videoFile")
            .await?;

    let Some(thumbnail) =
        upload_staged(state.media.as_ref(), form.take_file("thumbnail"), ResourceKind::Image).await
    else {
        discard(state.media.as_ref(), &video_file.public_id, ResourceKind::Video).await;
        return Err(AppError::UploadFailed("Failed to upload thumbnail".into()));
    };

    let input = CreateVideo {
        owner_id: auth.user_id,
        video_file_url: video_file.url.clone(),
        video_file_public_id: video_file.public_id.clone(),
        thumbnail_url: thumbnail.url.clone(),
        thumbnail_public_id: thumbnail.public_id.clone(),
        title,
        description,
        duration: video_file.duration.unwrap_or(0.0),
        is_published,
    };

    let video = match VideoRepo::create(&state.pool, &input).await {
        Ok(video) => video,
        Err(e) => {
            discard(state.media.as_ref(), &video_file.public_id, ResourceKind::Video).await;
            discard(state.media.as_ref(), &thumbnail.public_id, ResourceKind::Image).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        video_id = video.id,
        user_id = auth.user_id,
        is_published,
        "Video published",
    );
    Ok(ApiResponse::created(video, "Video uploaded successfully"))
}

/// GET /api/v1/video/{id}
///
/// Counts a view and, for signed-in callers, moves the video to the front
/// of their watch history. Hidden videos are reported as missing.
pub async fn get_video(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<VideoDetail>> {
    let viewer_id = viewer.user_id();

    if !VideoRepo::record_view(&state.pool, id, viewer_id).await? {
        return Err(AppError::Core(CoreError::not_found("Video", id)));
    }
    if let Some(user_id) = viewer_id {
        UserRepo::record_watch(&state.pool, user_id, id).await?;
    }

    let detail = VideoRepo::find_detail(&state.pool, id, viewer_id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Video", id)))?;

    Ok(ApiResponse::ok(detail, "Video fetched successfully"))
}

/// PATCH /api/v1/video/{id}
///
/// Multipart: optional `title`, `description` and file `thumbnail`. The old
/// thumbnail is removed from the media host only once the row points at the
/// new one.
pub async fn update_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<Video>> {
    let existing = owned_video(&state, id, &auth).await?;

    let mut form = MultipartForm::collect(&mut multipart, &state.stager, &["thumbnail"]).await?;
    let title = optional_text("title", form.text("title"), TITLE_MAX_LEN)?;
    let description = optional_text("description", form.text("description"), DESCRIPTION_MAX_LEN)?;

    if title.is_none() && description.is_none() && !form.has_file("thumbnail") {
        return Err(AppError::Core(CoreError::validation(
            "Nothing to update: send title, description or thumbnail",
        )));
    }

    let thumbnail = match form.take_file("thumbnail") {
        Some(staged) => Some(
            upload_required(&state, Some(staged), ResourceKind::Image, "thumbnail").await?,
        ),
        None => None,
    };

    let input = UpdateVideo {
        title,
        description,
        thumbnail: thumbnail
            .as_ref()
            .map(|t| (t.url.clone(), t.public_id.clone())),
    };

    let updated = match VideoRepo::update(&state.pool, id, &input).await {
        Ok(Some(video)) => video,
        result => {
            if let Some(new_thumbnail) = &thumbnail {
                discard(state.media.as_ref(), &new_thumbnail.public_id, ResourceKind::Image).await;
            }
            return match result {
                Err(e) => Err(e.into()),
                _ => Err(AppError::Core(CoreError::not_found("Video", id))),
            };
        }
    };

    if thumbnail.is_some() && !existing.thumbnail_public_id.is_empty() {
        discard(state.media.as_ref(), &existing.thumbnail_public_id, ResourceKind::Image).await;
    }

    tracing::info!(video_id = id, user_id = auth.user_id, "Video updated");
    Ok(ApiResponse::ok(updated, "Video updated successfully"))
}

/// DELETE /api/v1/video/{id}
///
/// Removes the row, everything that cascades from it, and both remote
/// assets. An asset that is already gone on the media host is not an error.
pub async fn delete_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let video = owned_video(&state, id, &auth).await?;

    if !VideoRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::not_found("Video", id)));
    }

    discard(state.media.as_ref(), &video.video_file_public_id, ResourceKind::Video).await;
    discard(state.media.as_ref(), &video.thumbnail_public_id, ResourceKind::Image).await;

    tracing::info!(video_id = id, user_id = auth.user_id, "Video deleted");
    Ok(ApiResponse::ok(json!({}), "Video deleted successfully"))
}

/// PATCH /api/v1/video/toggle/publish/{id}
pub async fn toggle_publish(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<Video>> {
    owned_video(&state, id, &auth).await?;

    let video = VideoRepo::toggle_publish(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Video", id)))?;

    tracing::info!(
        video_id = id,
        is_published = video.is_published,
        "Video publish status toggled",
    );
    Ok(ApiResponse::ok(video, "Publish status toggled successfully"))
}
