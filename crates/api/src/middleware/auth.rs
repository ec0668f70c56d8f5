//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use vidshare_core::error::CoreError;
use vidshare_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::cookies::{cookie_value, ACCESS_TOKEN_COOKIE};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user, from a Bearer token in the `Authorization` header or,
/// failing that, the `accessToken` cookie.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub username: String,
}

/// The raw access token carried by the request, if any.
///
/// A malformed `Authorization` header is an error rather than "absent", so
/// a broken client is told instead of silently treated as anonymous.
fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| {
            AppError::Core(CoreError::unauthorized("Invalid Authorization header"))
        })?;
        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>",
            ))
        })?;
        return Ok(Some(token.trim().to_string()));
    }
    Ok(cookie_value(&parts.headers, ACCESS_TOKEN_COOKIE))
}

fn authenticate(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims = validate_token(token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::unauthorized("Invalid or expired access token"))
    })?;
    Ok(AuthUser {
        user_id: claims.sub,
        username: claims.username,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::Core(CoreError::unauthorized("Unauthorized request")))?;
        authenticate(&token, state)
    }
}

/// Like [`AuthUser`] but anonymous requests pass through as `None`.
///
/// A token that is present but invalid or expired is still rejected with
/// 401, so clients learn to refresh instead of silently losing access to
/// their own unpublished content.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn user_id(&self) -> Option<DbId> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => authenticate(&token, state).map(|u| Self(Some(u))),
            None => Ok(Self(None)),
        }
    }
}
