//! Poll post model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use vidshare_core::types::{DbId, Timestamp};

use super::user::UserSummary;

/// A row from the `posts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: DbId,
    pub content: String,
    pub owner_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A poll option with its current vote tally.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionTally {
    #[serde(skip_serializing)]
    pub post_id: DbId,
    pub position: i32,
    pub label: String,
    pub votes: i64,
}

/// Base row for [`PostWithStats`], before options are attached.
#[derive(Debug, Clone, FromRow)]
pub struct PostStatsRow {
    pub id: DbId,
    pub content: String,
    pub likes_count: i64,
    pub is_liked: bool,
    pub my_vote: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[sqlx(flatten)]
    pub owner: UserSummary,
}

/// A post as shown on a channel: counters, poll tallies and the viewer's vote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithStats {
    pub id: DbId,
    pub content: String,
    pub likes_count: i64,
    pub is_liked: bool,
    /// Empty for plain text posts.
    pub options: Vec<PollOptionTally>,
    /// Option position the viewer voted for, if any.
    pub my_vote: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub owner: UserSummary,
}

impl PostWithStats {
    pub fn from_row(row: PostStatsRow, options: Vec<PollOptionTally>) -> Self {
        Self {
            id: row.id,
            content: row.content,
            likes_count: row.likes_count,
            is_liked: row.is_liked,
            options,
            my_vote: row.my_vote,
            created_at: row.created_at,
            updated_at: row.updated_at,
            owner: row.owner,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePost {
    pub owner_id: DbId,
    pub content: String,
    /// Already-validated option labels; empty for a plain post.
    pub options: Vec<String>,
}
