//! Like model: one row per (target, user).

use serde::Serialize;
use sqlx::FromRow;
use vidshare_core::types::{DbId, Timestamp};

/// A row from the `likes` table. Exactly one target column is set.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: DbId,
    pub video_id: Option<DbId>,
    pub comment_id: Option<DbId>,
    pub post_id: Option<DbId>,
    pub liked_by: DbId,
    pub created_at: Timestamp,
}

/// What a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(DbId),
    Comment(DbId),
    Post(DbId),
}

impl LikeTarget {
    /// The `likes` column holding this target's id.
    pub fn column(self) -> &'static str {
        match self {
            Self::Video(_) => "video_id",
            Self::Comment(_) => "comment_id",
            Self::Post(_) => "post_id",
        }
    }

    /// Entity name used in not-found errors.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Video(_) => "Video",
            Self::Comment(_) => "Comment",
            Self::Post(_) => "Post",
        }
    }

    pub fn id(self) -> DbId {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Post(id) => id,
        }
    }
}
