//! Channel subscription model.

use serde::Serialize;
use sqlx::FromRow;
use vidshare_core::types::{DbId, Timestamp};

use super::user::UserSummary;

/// A row from the `subscriptions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: DbId,
    pub subscriber_id: DbId,
    pub channel_id: DbId,
    pub created_at: Timestamp,
}

/// One side of a subscription listing (a subscriber or a channel).
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEntry {
    pub subscribed_at: Timestamp,
    /// Subscriber count of the listed user.
    pub subscribers_count: i64,
    #[sqlx(flatten)]
    pub user: UserSummary,
}
