//! Repository for the `videos` table.

use sqlx::PgPool;
use vidshare_core::listing::{Page, VideoListFilter};
use vidshare_core::types::DbId;

use super::{visible_to, VIDEO_SUMMARY_COLUMNS};
use crate::models::video::{CreateVideo, UpdateVideo, Video, VideoDetail, VideoSummary};

/// Column list for full `videos` rows.
const COLUMNS: &str = "\
    id, owner_id, video_file_url, video_file_public_id, \
    thumbnail_url, thumbnail_public_id, title, description, \
    duration, views, is_published, created_at, updated_at";

/// Provides CRUD and listing operations for videos.
pub struct VideoRepo;

impl VideoRepo {
    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// One page of videos visible to `filter.viewer_id`, with the total
    /// number of matches.
    ///
    /// Ordering is the requested sort column followed by `id` in the same
    /// direction, so pages never overlap when sort keys tie.
    pub async fn list(
        pool: &PgPool,
        filter: &VideoListFilter,
    ) -> Result<Page<VideoSummary>, sqlx::Error> {
        // $1 is always the viewer.
        let mut conditions = vec![visible_to(1)];
        let mut bind_idx = 2u32;

        if filter.title_pattern.is_some() {
            conditions.push(format!("v.title ILIKE ${bind_idx} ESCAPE '\\'"));
            bind_idx += 1;
        }
        if filter.owner_id.is_some() {
            conditions.push(format!("v.owner_id = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        let count_query = format!("SELECT COUNT(*) FROM videos v {where_clause}");
        let mut count = sqlx::query_scalar::<_, i64>(&count_query).bind(filter.viewer_id);
        if let Some(ref pattern) = filter.title_pattern {
            count = count.bind(pattern);
        }
        if let Some(owner_id) = filter.owner_id {
            count = count.bind(owner_id);
        }
        let total = count.fetch_one(pool).await?;

        let column = filter.sort_field.column();
        let direction = filter.sort_direction.sql();
        let query = format!(
            "SELECT {VIDEO_SUMMARY_COLUMNS} \
             FROM videos v \
             JOIN users u ON u.id = v.owner_id \
             {where_clause} \
             ORDER BY {column} {direction}, v.id {direction} \
             LIMIT ${bind_idx} OFFSET ${next_idx}",
            next_idx = bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, VideoSummary>(&query).bind(filter.viewer_id);
        if let Some(ref pattern) = filter.title_pattern {
            q = q.bind(pattern);
        }
        if let Some(owner_id) = filter.owner_id {
            q = q.bind(owner_id);
        }
        let docs = q
            .bind(filter.page.limit)
            .bind(filter.page.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page::new(docs, filter.page, total))
    }

    /// All videos owned by `owner_id`, newest first, published or not.
    pub async fn list_by_owner(pool: &PgPool, owner_id: DbId) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM videos WHERE owner_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Single video
    // -----------------------------------------------------------------------

    pub async fn create(pool: &PgPool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (\
                owner_id, video_file_url, video_file_public_id, \
                thumbnail_url, thumbnail_public_id, title, description, \
                duration, is_published\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(input.owner_id)
            .bind(&input.video_file_url)
            .bind(&input.video_file_public_id)
            .bind(&input.thumbnail_url)
            .bind(&input.thumbnail_public_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.duration)
            .bind(input.is_published)
            .fetch_one(pool)
            .await
    }

    /// Raw row lookup with no visibility check. Used for ownership checks.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether `id` exists and is visible to `viewer_id`.
    pub async fn is_visible(
        pool: &PgPool,
        id: DbId,
        viewer_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM videos v WHERE v.id = $1 AND {})",
            visible_to(2)
        );
        sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .bind(viewer_id)
            .fetch_one(pool)
            .await
    }

    /// Video page with like and subscription counters for `viewer_id`.
    /// Returns `None` when the video is missing or hidden from the viewer.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
        viewer_id: Option<DbId>,
    ) -> Result<Option<VideoDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {VIDEO_SUMMARY_COLUMNS}, \
                (SELECT COUNT(*) FROM likes l WHERE l.video_id = v.id) AS likes_count, \
                EXISTS (SELECT 1 FROM likes l \
                        WHERE l.video_id = v.id AND l.liked_by = $2) AS is_liked, \
                (SELECT COUNT(*) FROM subscriptions s \
                 WHERE s.channel_id = v.owner_id) AS owner_subscribers_count, \
                EXISTS (SELECT 1 FROM subscriptions s \
                        WHERE s.channel_id = v.owner_id AND s.subscriber_id = $2) AS is_subscribed \
             FROM videos v \
             JOIN users u ON u.id = v.owner_id \
             WHERE v.id = $1 AND {}",
            visible_to(2)
        );
        sqlx::query_as::<_, VideoDetail>(&query)
            .bind(id)
            .bind(viewer_id)
            .fetch_optional(pool)
            .await
    }

    /// Count one view, provided the viewer may see the video.
    ///
    /// Returns `false` when the video is missing or hidden.
    pub async fn record_view(
        pool: &PgPool,
        id: DbId,
        viewer_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE videos v SET views = v.views + 1 WHERE v.id = $1 AND {}",
            visible_to(2)
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(viewer_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update title, description and/or thumbnail. Only non-`None` fields
    /// in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateVideo,
    ) -> Result<Option<Video>, sqlx::Error> {
        let (thumbnail_url, thumbnail_public_id) = match &input.thumbnail {
            Some((url, public_id)) => (Some(url.as_str()), Some(public_id.as_str())),
            None => (None, None),
        };
        let query = format!(
            "UPDATE videos SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                thumbnail_url = COALESCE($4, thumbnail_url), \
                thumbnail_public_id = COALESCE($5, thumbnail_public_id) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(thumbnail_url)
            .bind(thumbnail_public_id)
            .fetch_optional(pool)
            .await
    }

    /// Flip `is_published`, returning the updated row.
    pub async fn toggle_publish(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET is_published = NOT is_published \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a video. Likes, comments, history and playlist entries go with
    /// it through `ON DELETE CASCADE`. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
