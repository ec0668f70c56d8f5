use axum::routing::get;
use axum::Router;

use crate::handlers::subscriptions;
use crate::state::AppState;

/// Routes mounted at `/subscriptions`. All require auth.
///
/// ```text
/// POST /c/{channelId}     -> toggle_subscription
/// GET  /c/{channelId}     -> channel_subscribers
/// GET  /u/{subscriberId}  -> subscribed_channels
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/c/{channel_id}",
            get(subscriptions::channel_subscribers).post(subscriptions::toggle_subscription),
        )
        .route("/u/{subscriber_id}", get(subscriptions::subscribed_channels))
}
