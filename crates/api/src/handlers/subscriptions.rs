//! Channel subscriptions.

use axum::extract::State;
use serde::Serialize;
use vidshare_core::error::CoreError;
use vidshare_core::types::DbId;
use vidshare_db::models::subscription::SubscriptionEntry;
use vidshare_db::repositories::{SubscriptionRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::extract::Path;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub is_subscribed: bool,
}

async fn ensure_user_exists(state: &AppState, id: DbId) -> AppResult<()> {
    if UserRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::not_found("User", id)));
    }
    Ok(())
}

/// POST /api/v1/subscriptions/c/{channelId}
pub async fn toggle_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<DbId>,
) -> AppResult<ApiResponse<SubscriptionStatus>> {
    if channel_id == auth.user_id {
        return Err(AppError::Core(CoreError::validation(
            "You cannot subscribe to your own channel",
        )));
    }
    ensure_user_exists(&state, channel_id).await?;

    let is_subscribed = SubscriptionRepo::toggle(&state.pool, auth.user_id, channel_id).await?;
    tracing::info!(
        subscriber_id = auth.user_id,
        channel_id,
        is_subscribed,
        "Subscription toggled",
    );

    let message = if is_subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };
    Ok(ApiResponse::ok(SubscriptionStatus { is_subscribed }, message))
}

/// GET /api/v1/subscriptions/c/{channelId}
pub async fn channel_subscribers(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(channel_id): Path<DbId>,
) -> AppResult<ApiResponse<Vec<SubscriptionEntry>>> {
    ensure_user_exists(&state, channel_id).await?;
    let subscribers = SubscriptionRepo::subscribers_of(&state.pool, channel_id).await?;
    Ok(ApiResponse::ok(subscribers, "Subscribers fetched successfully"))
}

/// GET /api/v1/subscriptions/u/{subscriberId}
pub async fn subscribed_channels(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(subscriber_id): Path<DbId>,
) -> AppResult<ApiResponse<Vec<SubscriptionEntry>>> {
    ensure_user_exists(&state, subscriber_id).await?;
    let channels = SubscriptionRepo::channels_of(&state.pool, subscriber_id).await?;
    Ok(ApiResponse::ok(channels, "Subscribed channels fetched successfully"))
}
