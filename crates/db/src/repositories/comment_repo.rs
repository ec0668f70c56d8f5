//! Repository for the `comments` table.

use sqlx::PgPool;
use vidshare_core::listing::{Page, PageRequest};
use vidshare_core::types::DbId;

use super::USER_SUMMARY_COLUMNS;
use crate::models::comment::{Comment, CommentWithOwner};

const COLUMNS: &str = "id, content, video_id, owner_id, created_at, updated_at";

/// Provides CRUD operations for comments.
pub struct CommentRepo;

impl CommentRepo {
    pub async fn create(
        pool: &PgPool,
        video_id: DbId,
        owner_id: DbId,
        content: &str,
    ) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments (video_id, owner_id, content) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(video_id)
            .bind(owner_id)
            .bind(content)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Comments on a video, newest first, with like counts.
    pub async fn list_for_video(
        pool: &PgPool,
        video_id: DbId,
        page: PageRequest,
    ) -> Result<Page<CommentWithOwner>, sqlx::Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(pool)
            .await?;

        let query = format!(
            "SELECT c.id, c.content, c.video_id, \
                (SELECT COUNT(*) FROM likes l WHERE l.comment_id = c.id) AS likes_count, \
                c.created_at, c.updated_at, {USER_SUMMARY_COLUMNS} \
             FROM comments c \
             JOIN users u ON u.id = c.owner_id \
             WHERE c.video_id = $1 \
             ORDER BY c.created_at DESC, c.id DESC \
             LIMIT $2 OFFSET $3"
        );
        let docs = sqlx::query_as::<_, CommentWithOwner>(&query)
            .bind(video_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page::new(docs, page, total))
    }

    pub async fn update_content(
        pool: &PgPool,
        id: DbId,
        content: &str,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("UPDATE comments SET content = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(content)
            .fetch_optional(pool)
            .await
    }

    /// Delete a comment and, by cascade, its likes.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
