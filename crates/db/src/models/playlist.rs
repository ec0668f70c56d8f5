//! Playlist entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use vidshare_core::types::{DbId, Timestamp};

use super::video::VideoSummary;

/// A row from the `playlists` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub owner_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A playlist with aggregate counters, used in per-user listings.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub playlist: Playlist,
    pub total_videos: i64,
    pub total_views: i64,
}

/// A playlist with its visible videos in playlist order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub videos: Vec<VideoSummary>,
    pub total_videos: i64,
    pub total_views: i64,
}

#[derive(Debug, Clone)]
pub struct CreatePlaylist {
    pub owner_id: DbId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePlaylist {
    pub name: Option<String>,
    pub description: Option<String>,
}
