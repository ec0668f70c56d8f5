//! Comment entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use vidshare_core::types::{DbId, Timestamp};

use super::user::UserSummary;

/// A row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: DbId,
    pub content: String,
    pub video_id: DbId,
    pub owner_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A comment as listed under a video.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithOwner {
    pub id: DbId,
    pub content: String,
    pub video_id: DbId,
    pub likes_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[sqlx(flatten)]
    pub owner: UserSummary,
}
