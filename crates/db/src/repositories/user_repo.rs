//! Repository for the `users` and `watch_history` tables.

use sqlx::PgPool;
use vidshare_core::listing::{Page, PageRequest};
use vidshare_core::types::{DbId, Timestamp};

use super::VIDEO_SUMMARY_COLUMNS;
use crate::models::user::{ChannelProfile, CreateUser, ProfileImage, UpdateAccount, User};
use crate::models::video::VideoSummary;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, full_name, password_hash, avatar_url, \
                        avatar_public_id, cover_image_url, cover_image_public_id, \
                        refresh_token_hash, refresh_token_expires_at, \
                        created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, full_name, password_hash, avatar_url, \
                                avatar_public_id, cover_image_url, cover_image_public_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.full_name)
            .bind(&input.password_hash)
            .bind(&input.avatar_url)
            .bind(&input.avatar_public_id)
            .bind(&input.cover_image_url)
            .bind(&input.cover_image_public_id)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by (already lower-cased) username.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Find the account to sign in to.
    ///
    /// Every identifier given must belong to that one account, so a username
    /// paired with someone else's email finds nothing. With neither given
    /// there is no match.
    pub async fn find_for_login(
        pool: &PgPool,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE ($1::text IS NULL OR username = $1)
               AND ($2::text IS NULL OR email = $2)"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find any user already holding either identifier, to report a taken
    /// username or email. Either side may be `None`.
    pub async fn find_by_username_or_email(
        pool: &PgPool,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE username = $1 OR email = $2
             ORDER BY id
             LIMIT 1"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find the user currently holding the refresh token with this hash.
    pub async fn find_by_refresh_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE refresh_token_hash = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Store a new refresh token hash valid until `expires_at`.
    pub async fn set_refresh_token(
        pool: &PgPool,
        id: DbId,
        hash: &str,
        expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $2, refresh_token_expires_at = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(hash)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Forget the user's refresh token (logout).
    pub async fn clear_refresh_token(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = NULL, refresh_token_expires_at = NULL
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace `old_hash` with `new_hash` only if `old_hash` is still current
    /// and unexpired.
    ///
    /// Returns `false` when another request rotated the token first or the
    /// old token has expired.
    pub async fn rotate_refresh_token(
        pool: &PgPool,
        id: DbId,
        old_hash: &str,
        new_hash: &str,
        expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $3, refresh_token_expires_at = $4
             WHERE id = $1 AND refresh_token_hash = $2 AND refresh_token_expires_at > NOW()",
        )
        .bind(id)
        .bind(old_hash)
        .bind(new_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update account details. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_account(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAccount,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.full_name)
            .bind(&input.email)
            .fetch_optional(pool)
            .await
    }

    /// Point a profile image at a newly uploaded asset.
    ///
    /// Returns the updated user and the public id of the asset it replaced,
    /// or `None` if the user does not exist.
    pub async fn replace_image(
        pool: &PgPool,
        id: DbId,
        image: ProfileImage,
        url: &str,
        public_id: &str,
    ) -> Result<Option<(User, Option<String>)>, sqlx::Error> {
        let (url_col, public_id_col) = image.columns();
        let mut tx = pool.begin().await?;

        let previous: Option<Option<String>> = sqlx::query_scalar(&format!(
            "SELECT {public_id_col} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous) = previous else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE users SET {url_col} = $2, {public_id_col} = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(url)
            .bind(public_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((user, previous)))
    }

    /// Channel page for `username`, with subscription counters relative to
    /// `viewer_id`.
    pub async fn channel_profile(
        pool: &PgPool,
        username: &str,
        viewer_id: Option<DbId>,
    ) -> Result<Option<ChannelProfile>, sqlx::Error> {
        sqlx::query_as::<_, ChannelProfile>(
            "SELECT u.id, u.username, u.full_name, u.avatar_url AS avatar,
                    u.cover_image_url AS cover_image,
                    (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id)
                        AS subscribers_count,
                    (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id)
                        AS channels_subscribed_to_count,
                    EXISTS (SELECT 1 FROM subscriptions s
                            WHERE s.channel_id = u.id AND s.subscriber_id = $2)
                        AS is_subscribed,
                    u.created_at
             FROM users u
             WHERE u.username = $1",
        )
        .bind(username)
        .bind(viewer_id)
        .fetch_optional(pool)
        .await
    }

    /// Move `video_id` to the front of the user's watch history.
    pub async fn record_watch(
        pool: &PgPool,
        user_id: DbId,
        video_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO watch_history (user_id, video_id) VALUES ($1, $2)
             ON CONFLICT (user_id, video_id) DO UPDATE SET watched_at = NOW()",
        )
        .bind(user_id)
        .bind(video_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Watch history, most recently watched first. Videos unpublished since
    /// they were watched drop out unless the user owns them.
    pub async fn watch_history(
        pool: &PgPool,
        user_id: DbId,
        page: PageRequest,
    ) -> Result<Page<VideoSummary>, sqlx::Error> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM watch_history h
             JOIN videos v ON v.id = h.video_id
             WHERE h.user_id = $1 AND (v.is_published OR v.owner_id = $1)",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "SELECT {VIDEO_SUMMARY_COLUMNS}
             FROM watch_history h
             JOIN videos v ON v.id = h.video_id
             JOIN users u ON u.id = v.owner_id
             WHERE h.user_id = $1 AND (v.is_published OR v.owner_id = $1)
             ORDER BY h.watched_at DESC
             LIMIT $2 OFFSET $3"
        );
        let docs = sqlx::query_as::<_, VideoSummary>(&query)
            .bind(user_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page::new(docs, page, total))
    }
}
