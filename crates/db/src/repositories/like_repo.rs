//! Repository for the `likes` table.

use sqlx::PgPool;
use vidshare_core::types::DbId;

use super::{visible_to, VIDEO_SUMMARY_COLUMNS};
use crate::models::like::LikeTarget;
use crate::models::video::VideoSummary;

/// Provides like toggling and liked-video listing.
pub struct LikeRepo;

impl LikeRepo {
    /// Flip the like on `target` for `user_id`.
    ///
    /// Returns `true` if the target is now liked. Two concurrent toggles by
    /// the same user never produce duplicate rows; the partial unique
    /// indexes turn the losing insert into a no-op.
    pub async fn toggle(
        pool: &PgPool,
        target: LikeTarget,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let column = target.column();

        let removed = sqlx::query(&format!(
            "DELETE FROM likes WHERE {column} = $1 AND liked_by = $2"
        ))
        .bind(target.id())
        .bind(user_id)
        .execute(pool)
        .await?;
        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(&format!(
            "INSERT INTO likes ({column}, liked_by) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        ))
        .bind(target.id())
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(true)
    }

    /// Number of likes on `target`.
    pub async fn count(pool: &PgPool, target: LikeTarget) -> Result<i64, sqlx::Error> {
        let column = target.column();
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM likes WHERE {column} = $1"))
            .bind(target.id())
            .fetch_one(pool)
            .await
    }

    /// Videos liked by `user_id`, most recently liked first. Videos that
    /// were unpublished after being liked are hidden unless the user owns
    /// them.
    pub async fn liked_videos(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<VideoSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {VIDEO_SUMMARY_COLUMNS} \
             FROM likes l \
             JOIN videos v ON v.id = l.video_id \
             JOIN users u ON u.id = v.owner_id \
             WHERE l.liked_by = $1 AND {} \
             ORDER BY l.created_at DESC, l.id DESC",
            visible_to(1)
        );
        sqlx::query_as::<_, VideoSummary>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
