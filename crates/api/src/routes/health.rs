use axum::extract::State;
use axum::{routing::get, Router};
use serde::Serialize;

use crate::response::ApiResponse;
use crate::state::AppState;

/// Health check payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
}

/// GET /healthcheck
async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    let db_healthy = vidshare_db::health_check(&state.pool).await.is_ok();
    let status = if db_healthy { "ok" } else { "degraded" };

    ApiResponse::ok(
        HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            db_healthy,
        },
        "Health check passed",
    )
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/healthcheck", get(health_check))
}
