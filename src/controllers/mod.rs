pub mod auth;
pub mod bookings;
pub mod movies;
pub mod shows;
pub mod theaters;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::AppState;

pub fn routes() -> axum::Router<Arc<AppState>> {
    axum::Router::new()
        .merge(movies::routes())
        .merge(theaters::routes())
        .merge(shows::routes())
        .merge(bookings::routes())
        .merge(auth::routes())
}

// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = state.db.ping().await.is_ok();
    let redis = state.redis.ping().await.is_ok();
    let status = if database && redis {
        StatusCode::OK
    } else {
        tracing::warn!(database, redis, "health check degraded");
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!({ "database": database, "redis": redis })))
}
