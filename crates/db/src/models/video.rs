//! Video entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use vidshare_core::types::{DbId, Timestamp};

use super::user::UserSummary;

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: DbId,
    pub owner_id: DbId,
    #[serde(rename = "videoFile")]
    pub video_file_url: String,
    #[serde(skip_serializing)]
    pub video_file_public_id: String,
    #[serde(rename = "thumbnail")]
    pub thumbnail_url: String,
    #[serde(skip_serializing)]
    pub thumbnail_public_id: String,
    pub title: String,
    pub description: String,
    /// Seconds, as reported by the media host.
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Listing item: a video with its owner denormalized.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: DbId,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: Timestamp,
    #[sqlx(flatten)]
    pub owner: UserSummary,
}

/// Single-video page: summary plus engagement counters for the viewer.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub video: VideoSummary,
    pub likes_count: i64,
    pub is_liked: bool,
    pub owner_subscribers_count: i64,
    pub is_subscribed: bool,
}

/// DTO for inserting a video once both assets are on the media host.
#[derive(Debug, Clone)]
pub struct CreateVideo {
    pub owner_id: DbId,
    pub video_file_url: String,
    pub video_file_public_id: String,
    pub thumbnail_url: String,
    pub thumbnail_public_id: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub is_published: bool,
}

/// DTO for `PATCH /video/{id}`. All fields are optional; the thumbnail pair
/// is either both set or both `None`.
#[derive(Debug, Clone, Default)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<(String, String)>,
}
