//! Repository for the `subscriptions` table.

use sqlx::PgPool;
use vidshare_core::types::DbId;

use super::USER_SUMMARY_COLUMNS;
use crate::models::subscription::SubscriptionEntry;

/// Provides subscription toggling and listings.
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Flip `subscriber_id`'s subscription to `channel_id`.
    ///
    /// Returns `true` if the subscriber is now subscribed.
    pub async fn toggle(
        pool: &PgPool,
        subscriber_id: DbId,
        channel_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let removed =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(pool)
                .await?;
        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO subscriptions (subscriber_id, channel_id) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_subscriptions_pair DO NOTHING",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(pool)
        .await?;
        Ok(true)
    }

    pub async fn count_subscribers(pool: &PgPool, channel_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1")
            .bind(channel_id)
            .fetch_one(pool)
            .await
    }

    /// Users subscribed to `channel_id`, newest subscription first.
    pub async fn subscribers_of(
        pool: &PgPool,
        channel_id: DbId,
    ) -> Result<Vec<SubscriptionEntry>, sqlx::Error> {
        let query = format!(
            "SELECT s.created_at AS subscribed_at, \
                (SELECT COUNT(*) FROM subscriptions x WHERE x.channel_id = u.id) AS subscribers_count, \
                {USER_SUMMARY_COLUMNS} \
             FROM subscriptions s \
             JOIN users u ON u.id = s.subscriber_id \
             WHERE s.channel_id = $1 \
             ORDER BY s.created_at DESC, s.id DESC"
        );
        sqlx::query_as::<_, SubscriptionEntry>(&query)
            .bind(channel_id)
            .fetch_all(pool)
            .await
    }

    /// Channels `subscriber_id` follows, newest subscription first.
    pub async fn channels_of(
        pool: &PgPool,
        subscriber_id: DbId,
    ) -> Result<Vec<SubscriptionEntry>, sqlx::Error> {
        let query = format!(
            "SELECT s.created_at AS subscribed_at, \
                (SELECT COUNT(*) FROM subscriptions x WHERE x.channel_id = u.id) AS subscribers_count, \
                {USER_SUMMARY_COLUMNS} \
             FROM subscriptions s \
             JOIN users u ON u.id = s.channel_id \
             WHERE s.subscriber_id = $1 \
             ORDER BY s.created_at DESC, s.id DESC"
        );
        sqlx::query_as::<_, SubscriptionEntry>(&query)
            .bind(subscriber_id)
            .fetch_all(pool)
            .await
    }
}
