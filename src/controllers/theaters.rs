use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AdminUser;
use crate::models::{Theater, TheaterInput};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/theaters", get(list_theaters).post(create_theater))
        .route("/theaters/{id}", get(get_theater).put(update_theater).delete(delete_theater))
}

#[derive(Debug, Deserialize)]
pub struct TheatersQuery {
    pub city: Option<String>,
}

// GET /api/theaters
async fn list_theaters(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TheatersQuery>,
) -> AppResult<impl IntoResponse> {
    let mut theaters = state.cache.get_theaters().await?;
    if let Some(city) = params.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        theaters.retain(|t| t.city.eq_ignore_ascii_case(city));
    }
    Ok(Json(theaters))
}

// GET /api/theaters/{id}
async fn get_theater(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let theater = Theater::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Theater"))?;
    Ok(Json(theater))
}

// POST /api/theaters
async fn create_theater(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(input): Json<TheaterInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let theater = Theater::create(&state.db, &input).await?;
    state.cache.invalidate_theaters().await;
    tracing::info!(theater_id = %theater.id, admin = %admin.user_id, "theater created");
    Ok((StatusCode::CREATED, Json(theater)))
}

// PUT /api/theaters/{id}
async fn update_theater(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(input): Json<TheaterInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let theater = Theater::update(&state.db, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Theater"))?;
    state.cache.invalidate_theaters().await;
    tracing::info!(theater_id = %id, admin = %admin.user_id, "theater updated");
    Ok(Json(theater))
}

// DELETE /api/theaters/{id}
async fn delete_theater(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !Theater::delete(&state.db, id).await? {
        return Err(AppError::not_found("Theater"));
    }
    state.cache.invalidate_theaters().await;
    tracing::info!(theater_id = %id, admin = %admin.user_id, "theater deleted");
    Ok(StatusCode::NO_CONTENT)
}
