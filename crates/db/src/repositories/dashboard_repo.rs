//! Aggregates for the channel dashboard.

use sqlx::PgPool;
use vidshare_core::types::DbId;

use crate::models::dashboard::ChannelStats;

pub struct DashboardRepo;

impl DashboardRepo {
    /// Totals across every video the channel owns, published or not.
    pub async fn channel_stats(pool: &PgPool, owner_id: DbId) -> Result<ChannelStats, sqlx::Error> {
        sqlx::query_as::<_, ChannelStats>(
            "SELECT \
                (SELECT COUNT(*) FROM videos WHERE owner_id = $1) AS total_videos, \
                (SELECT COALESCE(SUM(views), 0)::BIGINT FROM videos WHERE owner_id = $1) AS total_views, \
                (SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1) AS total_subscribers, \
                (SELECT COUNT(*) FROM likes l JOIN videos v ON v.id = l.video_id \
                 WHERE v.owner_id = $1) AS total_likes",
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await
    }
}
