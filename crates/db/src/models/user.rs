//! User entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use vidshare_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password and refresh-token hashes -- NEVER serialize this to
/// API responses directly. Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub avatar_public_id: String,
    pub cover_image_url: Option<String>,
    pub cover_image_public_id: Option<String>,
    pub refresh_token_hash: Option<String>,
    pub refresh_token_expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no secrets).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar_url.clone(),
            cover_image: user.cover_image_url.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Compact user shape embedded in videos, comments, subscriptions, etc.
///
/// Queries select it with the `u_` column aliases from
/// [`crate::repositories::USER_SUMMARY_COLUMNS`].
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[sqlx(rename = "u_id")]
    pub id: DbId,
    #[sqlx(rename = "u_username")]
    pub username: String,
    #[sqlx(rename = "u_full_name")]
    pub full_name: String,
    #[sqlx(rename = "u_avatar")]
    pub avatar: String,
}

/// Public channel page for `GET /users/c/{username}`.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: DbId,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    /// Whether the requesting user subscribes to this channel.
    pub is_subscribed: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a new user. Media has already been uploaded.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub avatar_public_id: String,
    pub cover_image_url: Option<String>,
    pub cover_image_public_id: Option<String>,
}

/// DTO for `PATCH /users/update-account`. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccount {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Which profile image an upload replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileImage {
    Avatar,
    CoverImage,
}

impl ProfileImage {
    /// `(url_column, public_id_column)` for this image.
    pub fn columns(self) -> (&'static str, &'static str) {
        match self {
            Self::Avatar => ("avatar_url", "avatar_public_id"),
            Self::CoverImage => ("cover_image_url", "cover_image_public_id"),
        }
    }

    /// Multipart field name carrying this image.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::CoverImage => "coverImage",
        }
    }
}
