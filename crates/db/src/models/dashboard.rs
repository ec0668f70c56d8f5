//! Channel dashboard aggregates.

use serde::Serialize;
use sqlx::FromRow;

use super::video::Video;

/// Totals across the caller's own channel.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_subscribers: i64,
    pub total_likes: i64,
}

/// Response body of `GET /users/dashboard`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: ChannelStats,
    pub videos: Vec<Video>,
}
