//! Repository for `playlists` and `playlist_videos`.

use sqlx::PgPool;
use vidshare_core::types::DbId;

use super::{visible_to, VIDEO_SUMMARY_COLUMNS};
use crate::models::playlist::{
    CreatePlaylist, Playlist, PlaylistDetail, PlaylistSummary, UpdatePlaylist,
};
use crate::models::video::VideoSummary;

const COLUMNS: &str = "id, name, description, owner_id, created_at, updated_at";

/// Provides CRUD and membership operations for playlists.
pub struct PlaylistRepo;

impl PlaylistRepo {
    pub async fn create(pool: &PgPool, input: &CreatePlaylist) -> Result<Playlist, sqlx::Error> {
        let query = format!(
            "INSERT INTO playlists (owner_id, name, description) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Playlist>(&query)
            .bind(input.owner_id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Playlist>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM playlists WHERE id = $1");
        sqlx::query_as::<_, Playlist>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A playlist with the videos `viewer_id` may see, in insertion order.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
        viewer_id: Option<DbId>,
    ) -> Result<Option<PlaylistDetail>, sqlx::Error> {
        let Some(playlist) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let query = format!(
            "SELECT {VIDEO_SUMMARY_COLUMNS} \
             FROM playlist_videos pv \
             JOIN videos v ON v.id = pv.video_id \
             JOIN users u ON u.id = v.owner_id \
             WHERE pv.playlist_id = $1 AND {} \
             ORDER BY pv.position, pv.added_at",
            visible_to(2)
        );
        let videos = sqlx::query_as::<_, VideoSummary>(&query)
            .bind(id)
            .bind(viewer_id)
            .fetch_all(pool)
            .await?;

        let total_videos = videos.len() as i64;
        let total_views = videos.iter().map(|v| v.views).sum();
        Ok(Some(PlaylistDetail {
            playlist,
            videos,
            total_videos,
            total_views,
        }))
    }

    /// Playlists owned by `owner_id`, newest first, with counters over
    /// their published videos.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<PlaylistSummary>, sqlx::Error> {
        sqlx::query_as::<_, PlaylistSummary>(
            "SELECT p.id, p.name, p.description, p.owner_id, p.created_at, p.updated_at, \
                COUNT(v.id) AS total_videos, \
                COALESCE(SUM(v.views), 0)::BIGINT AS total_views \
             FROM playlists p \
             LEFT JOIN playlist_videos pv ON pv.playlist_id = p.id \
             LEFT JOIN videos v ON v.id = pv.video_id AND v.is_published \
             WHERE p.owner_id = $1 \
             GROUP BY p.id \
             ORDER BY p.created_at DESC, p.id DESC",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePlaylist,
    ) -> Result<Option<Playlist>, sqlx::Error> {
        let query = format!(
            "UPDATE playlists SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Playlist>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append a video to the end of a playlist.
    ///
    /// Returns `false` if the video was already present.
    pub async fn add_video(
        pool: &PgPool,
        playlist_id: DbId,
        video_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO playlist_videos (playlist_id, video_id, position) \
             SELECT $1, $2, COALESCE(MAX(position), 0) + 1 \
             FROM playlist_videos WHERE playlist_id = $1 \
             ON CONFLICT (playlist_id, video_id) DO NOTHING",
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` if the video was not in the playlist.
    pub async fn remove_video(
        pool: &PgPool,
        playlist_id: DbId,
        video_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
                .bind(playlist_id)
                .bind(video_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
