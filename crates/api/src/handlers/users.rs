//! Handlers for the `/users` resource: registration, sessions, profile
//! maintenance, channel pages, watch history and the channel dashboard.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use vidshare_core::error::CoreError;
use vidshare_core::listing::Page;
use vidshare_core::types::DbId;
use vidshare_core::validation::{
    normalize_email, normalize_username, optional_text, require_text, FULL_NAME_MAX_LEN,
};
use vidshare_db::models::dashboard::Dashboard;
use vidshare_db::models::user::{
    ChannelProfile, CreateUser, ProfileImage, UpdateAccount, User, UserResponse,
};
use vidshare_db::models::video::VideoSummary;
use vidshare_db::repositories::{DashboardRepo, UserRepo, VideoRepo};
use vidshare_media::{discard, upload_staged, ResourceKind};

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::cookies::{
    auth_cookie, cookie_value, expired_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path, Query};
use crate::handlers::{upload_required, PageQuery};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::upload::MultipartForm;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /users/login`. One of `email` or `username`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: String,
}

/// Optional body of `POST /users/refresh-token`; the cookie wins.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

type CookieHeaders = AppendHeaders<[(axum::http::HeaderName, String); 2]>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::unauthorized(msg))
}

/// Mint an access token and a fresh refresh token for `user`, storing the
/// refresh token hash. Any previously issued refresh token stops working.
async fn issue_tokens(state: &AppState, user: &User) -> AppResult<TokenPair> {
    let jwt = &state.config.jwt;
    let access_token = generate_access_token(user.id, &user.username, &user.email, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    let (refresh_token, refresh_hash) = generate_refresh_token();
    let expires_at = Utc::now() + Duration::days(jwt.refresh_token_expiry_days);
    UserRepo::set_refresh_token(&state.pool, user.id, &refresh_hash, expires_at).await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

fn session_cookies(state: &AppState, tokens: &TokenPair) -> CookieHeaders {
    let jwt = &state.config.jwt;
    let secure = state.config.cookie_secure;
    AppendHeaders([
        (
            SET_COOKIE,
            auth_cookie(
                ACCESS_TOKEN_COOKIE,
                &tokens.access_token,
                jwt.access_token_max_age_secs(),
                secure,
            ),
        ),
        (
            SET_COOKIE,
            auth_cookie(
                REFRESH_TOKEN_COOKIE,
                &tokens.refresh_token,
                jwt.refresh_token_max_age_secs(),
                secure,
            ),
        ),
    ])
}

fn cleared_cookies(state: &AppState) -> CookieHeaders {
    let secure = state.config.cookie_secure;
    AppendHeaders([
        (SET_COOKIE, expired_cookie(ACCESS_TOKEN_COOKIE, secure)),
        (SET_COOKIE, expired_cookie(REFRESH_TOKEN_COOKIE, secure)),
    ])
}

async fn load_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("User", id)))
}

// ---------------------------------------------------------------------------
// Registration and sessions
// ---------------------------------------------------------------------------

/// POST /api/v1/users/register
///
/// Multipart: `fullName`, `email`, `username`, `password`, file `avatar`
/// (required) and file `coverImage` (optional). Everything is validated and
/// checked for duplicates before anything is sent to the media host.
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let mut form =
        MultipartForm::collect(&mut multipart, &state.stager, &["avatar", "coverImage"]).await?;

    let full_name = require_text(
        "fullName",
        form.text("fullName").unwrap_or_default(),
        FULL_NAME_MAX_LEN,
    )?;
    let email = normalize_email(form.require_text("email")?)?;
    let username = normalize_username(form.require_text("username")?)?;
    let password = form.require_text("password")?.to_string();
    validate_password_strength(&password)?;

    if !form.has_file("avatar") {
        return Err(AppError::Core(CoreError::validation(
            "avatar file is required",
        )));
    }

    if let Some(existing) =
        UserRepo::find_by_username_or_email(&state.pool, Some(&username), Some(&email)).await?
    {
        let msg = if existing.username == username {
            "Username is already taken"
        } else {
            "Email is already registered"
        };
        return Err(AppError::Core(CoreError::Conflict(msg.into())));
    }

    let password_hash = hash_password(&password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let avatar =
        upload_required(&state, form.take_file("avatar"), ResourceKind::Image, "avatar").await?;

    let cover = match form.take_file("coverImage") {
        Some(staged) => {
            match upload_staged(state.media.as_ref(), Some(staged), ResourceKind::Image).await {
                Some(asset) => Some(asset),
                None => {
                    discard(state.media.as_ref(), &avatar.public_id, ResourceKind::Image).await;
                    return Err(AppError::UploadFailed("Failed to upload coverImage".into()));
                }
            }
        }
        None => None,
    };

    let input = CreateUser {
        username,
        email,
        full_name,
        password_hash,
        avatar_url: avatar.url.clone(),
        avatar_public_id: avatar.public_id.clone(),
        cover_image_url: cover.as_ref().map(|c| c.url.clone()),
        cover_image_public_id: cover.as_ref().map(|c| c.public_id.clone()),
    };

    let user = match UserRepo::create(&state.pool, &input).await {
        Ok(user) => user,
        Err(e) => {
            // Lost a race with a concurrent registration, or the insert failed.
            discard(state.media.as_ref(), &avatar.public_id, ResourceKind::Image).await;
            if let Some(cover) = &cover {
                discard(state.media.as_ref(), &cover.public_id, ResourceKind::Image).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok(ApiResponse::created(
        UserResponse::from(&user),
        "User registered successfully",
    ))
}

/// POST /api/v1/users/login
///
/// Unknown user and wrong password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let username = input
        .username
        .as_deref()
        .map(|u| u.trim().to_lowercase())
        .filter(|u| !u.is_empty());
    let email = input
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());

    if username.is_none() && email.is_none() {
        return Err(AppError::Core(CoreError::validation(
            "username or email is required",
        )));
    }

    let user =
        UserRepo::find_for_login(&state.pool, username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| unauthorized("Invalid user credentials"))?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(unauthorized("Invalid user credentials"));
    }

    let tokens = issue_tokens(&state, &user).await?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        session_cookies(&state, &tokens),
        ApiResponse::ok(
            LoginResponse {
                user: UserResponse::from(&user),
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

/// POST /api/v1/users/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    UserRepo::clear_refresh_token(&state.pool, auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, "User logged out");

    Ok((
        cleared_cookies(&state),
        ApiResponse::ok(json!({}), "User logged out"),
    ))
}

/// POST /api/v1/users/refresh-token
///
/// Accepts the refresh token from the `refreshToken` cookie or a JSON body
/// `{ "refreshToken": ... }`. The presented token is rotated: it stops
/// working the moment a new one is issued.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let from_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
            .refresh_token
    };

    let presented = cookie_value(&headers, REFRESH_TOKEN_COOKIE)
        .or(from_body)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| unauthorized("Refresh token is required"))?;

    let old_hash = hash_refresh_token(&presented);
    let user = UserRepo::find_by_refresh_token_hash(&state.pool, &old_hash)
        .await?
        .ok_or_else(|| unauthorized("Invalid refresh token"))?;

    let jwt = &state.config.jwt;
    let (refresh_token, new_hash) = generate_refresh_token();
    let expires_at = Utc::now() + Duration::days(jwt.refresh_token_expiry_days);

    let rotated =
        UserRepo::rotate_refresh_token(&state.pool, user.id, &old_hash, &new_hash, expires_at)
            .await?;
    if !rotated {
        return Err(unauthorized("Refresh token is expired or used"));
    }

    let access_token = generate_access_token(user.id, &user.username, &user.email, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    tracing::debug!(user_id = user.id, "Access token refreshed");

    let tokens = TokenPair {
        access_token,
        refresh_token,
    };
    Ok((
        session_cookies(&state, &tokens),
        ApiResponse::ok(tokens, "Access token refreshed"),
    ))
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// POST /api/v1/users/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = load_user(&state, auth.user_id).await?;

    let old_valid = verify_password(&input.old_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !old_valid {
        return Err(AppError::Core(CoreError::validation("Invalid old password")));
    }

    validate_password_strength(&input.new_password)?;
    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &new_hash).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

/// GET /api/v1/users/current-user
pub async fn current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = load_user(&state, auth.user_id).await?;
    Ok(ApiResponse::ok(
        UserResponse::from(&user),
        "Current user fetched successfully",
    ))
}

/// PATCH /api/v1/users/update-account
pub async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UpdateAccountRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let full_name = optional_text("fullName", input.full_name.as_deref(), FULL_NAME_MAX_LEN)?;
    let email = match input.email.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(normalize_email(raw)?),
    };
    if full_name.is_none() && email.is_none() {
        return Err(AppError::Core(CoreError::validation(
            "fullName or email is required",
        )));
    }

    let user = UserRepo::update_account(&state.pool, auth.user_id, &UpdateAccount { full_name, email })
        .await?
        .ok_or(AppError::Core(CoreError::not_found("User", auth.user_id)))?;

    tracing::info!(user_id = user.id, "Account details updated");
    Ok(ApiResponse::ok(
        UserResponse::from(&user),
        "Account details updated successfully",
    ))
}

/// PATCH /api/v1/users/avatar
pub async fn update_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = replace_profile_image(&state, &auth, &mut multipart, ProfileImage::Avatar).await?;
    Ok(ApiResponse::ok(user, "Avatar updated successfully"))
}

/// PATCH /api/v1/users/cover-image
pub async fn update_cover_image(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let user =
        replace_profile_image(&state, &auth, &mut multipart, ProfileImage::CoverImage).await?;
    Ok(ApiResponse::ok(user, "Cover image updated successfully"))
}

/// Upload the new image, point the row at it, then drop the old asset.
///
/// If the row update fails the new upload is discarded instead, so exactly
/// one of the two assets survives.
async fn replace_profile_image(
    state: &AppState,
    auth: &AuthUser,
    multipart: &mut Multipart,
    image: ProfileImage,
) -> AppResult<UserResponse> {
    let field = image.field_name();
    let mut form = MultipartForm::collect(multipart, &state.stager, &[field]).await?;
    let asset = upload_required(state, form.take_file(field), ResourceKind::Image, field).await?;

    let replaced = UserRepo::replace_image(
        &state.pool,
        auth.user_id,
        image,
        &asset.url,
        &asset.public_id,
    )
    .await;

    let (user, previous) = match replaced {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            discard(state.media.as_ref(), &asset.public_id, ResourceKind::Image).await;
            return Err(AppError::Core(CoreError::not_found("User", auth.user_id)));
        }
        Err(e) => {
            discard(state.media.as_ref(), &asset.public_id, ResourceKind::Image).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = previous.filter(|p| !p.is_empty()) {
        discard(state.media.as_ref(), &previous, ResourceKind::Image).await;
    }

    tracing::info!(user_id = user.id, image = field, "Profile image replaced");
    Ok(UserResponse::from(&user))
}

// ---------------------------------------------------------------------------
// Channel, history, dashboard
// ---------------------------------------------------------------------------

/// GET /api/v1/users/c/{username}
pub async fn channel_profile(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ChannelProfile>> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::Core(CoreError::validation("username is missing")));
    }

    let profile = UserRepo::channel_profile(&state.pool, &username, viewer.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Channel does not exist".into()))?;

    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

/// GET /api/v1/users/history
pub async fn watch_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<VideoSummary>>> {
    let page = UserRepo::watch_history(&state.pool, auth.user_id, params.request()).await?;
    Ok(ApiResponse::ok(page, "Watch history fetched successfully"))
}

/// GET /api/v1/users/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<ApiResponse<Dashboard>> {
    let stats = DashboardRepo::channel_stats(&state.pool, auth.user_id).await?;
    let videos = VideoRepo::list_by_owner(&state.pool, auth.user_id).await?;
    Ok(ApiResponse::ok(
        Dashboard { stats, videos },
        "Channel dashboard fetched successfully",
    ))
}
