//! Repository for poll posts: `posts`, `post_options` and `post_votes`.

use std::collections::HashMap;

use sqlx::PgPool;
use vidshare_core::types::DbId;

use super::USER_SUMMARY_COLUMNS;
use crate::models::post::{CreatePost, PollOptionTally, Post, PostStatsRow, PostWithStats};

const COLUMNS: &str = "id, content, owner_id, created_at, updated_at";

/// Provides CRUD and voting operations for posts.
pub struct PostRepo;

impl PostRepo {
    /// Insert a post and its options in one transaction. Options are
    /// numbered from 0 in the order given.
    pub async fn create(pool: &PgPool, input: &CreatePost) -> Result<Post, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO posts (owner_id, content) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        let post = sqlx::query_as::<_, Post>(&query)
            .bind(input.owner_id)
            .bind(&input.content)
            .fetch_one(&mut *tx)
            .await?;

        if !input.options.is_empty() {
            let positions: Vec<i32> = (0..input.options.len() as i32).collect();
            sqlx::query(
                "INSERT INTO post_options (post_id, position, label) \
                 SELECT $1, * FROM UNNEST($2::INTEGER[], $3::TEXT[])",
            )
            .bind(post.id)
            .bind(&positions)
            .bind(&input.options)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(post)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE id = $1");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Posts by `owner_id`, newest first, with tallies and the viewer's vote.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        viewer_id: Option<DbId>,
    ) -> Result<Vec<PostWithStats>, sqlx::Error> {
        let query = format!(
            "SELECT p.id, p.content, \
                (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count, \
                EXISTS (SELECT 1 FROM likes l \
                        WHERE l.post_id = p.id AND l.liked_by = $2) AS is_liked, \
                (SELECT pv.option_position FROM post_votes pv \
                 WHERE pv.post_id = p.id AND pv.user_id = $2) AS my_vote, \
                p.created_at, p.updated_at, {USER_SUMMARY_COLUMNS} \
             FROM posts p \
             JOIN users u ON u.id = p.owner_id \
             WHERE p.owner_id = $1 \
             ORDER BY p.created_at DESC, p.id DESC"
        );
        let rows = sqlx::query_as::<_, PostStatsRow>(&query)
            .bind(owner_id)
            .bind(viewer_id)
            .fetch_all(pool)
            .await?;

        let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
        let mut tallies = Self::tallies(pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let options = tallies.remove(&row.id).unwrap_or_default();
                PostWithStats::from_row(row, options)
            })
            .collect())
    }

    /// Option tallies for the given posts, grouped by post id and ordered
    /// by option position.
    pub async fn tallies(
        pool: &PgPool,
        post_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<PollOptionTally>>, sqlx::Error> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, PollOptionTally>(
            "SELECT o.post_id, o.position, o.label, COUNT(v.user_id) AS votes \
             FROM post_options o \
             LEFT JOIN post_votes v \
                ON v.post_id = o.post_id AND v.option_position = o.position \
             WHERE o.post_id = ANY($1) \
             GROUP BY o.post_id, o.position, o.label \
             ORDER BY o.post_id, o.position",
        )
        .bind(post_ids)
        .fetch_all(pool)
        .await?;

        let mut grouped: HashMap<DbId, Vec<PollOptionTally>> = HashMap::new();
        for row in rows {
            grouped.entry(row.post_id).or_default().push(row);
        }
        Ok(grouped)
    }

    /// Number of options on a post; 0 for plain text posts.
    pub async fn option_count(pool: &PgPool, post_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM post_options WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(pool)
            .await
    }

    /// Record or change `user_id`'s vote. A user holds at most one vote
    /// per post.
    pub async fn vote(
        pool: &PgPool,
        post_id: DbId,
        user_id: DbId,
        position: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO post_votes (post_id, user_id, option_position) VALUES ($1, $2, $3) \
             ON CONFLICT (post_id, user_id) \
             DO UPDATE SET option_position = EXCLUDED.option_position, voted_at = NOW()",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(position)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_content(
        pool: &PgPool,
        id: DbId,
        content: &str,
    ) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("UPDATE posts SET content = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .bind(content)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
