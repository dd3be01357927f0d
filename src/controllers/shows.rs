use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::catalog::{build_seat_map, group_by_theater};
use crate::error::{AppError, AppResult};
use crate::middleware::AdminUser;
use crate::models::{Show, ShowDetails, ShowFilter, ShowInput, Theater};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows", get(list_shows).post(create_show))
        .route("/shows/grouped", get(grouped_shows))
        .route("/shows/{id}", get(get_show).put(update_show).delete(delete_show))
        .route("/shows/{id}/seats", get(seat_map))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedQuery {
    pub movie_id: Uuid,
    pub date: Option<NaiveDate>,
}

// GET /api/shows
async fn list_shows(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ShowFilter>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(ShowDetails::list(&state.db, &filter).await?))
}

// GET /api/shows/grouped
async fn grouped_shows(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GroupedQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = ShowFilter {
        movie_id: Some(params.movie_id),
        theater_id: None,
        date: params.date,
    };
    let shows = ShowDetails::list(&state.db, &filter).await?;
    Ok(Json(group_by_theater(shows)))
}

// GET /api/shows/{id}
async fn get_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let show = ShowDetails::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Show"))?;
    Ok(Json(show))
}

// GET /api/shows/{id}/seats
async fn seat_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    if ShowDetails::find(&state.db, id).await?.is_none() {
        return Err(AppError::not_found("Show"));
    }

    let sold: BTreeSet<String> = Show::sold_seats(&state.db, id).await?.into_iter().collect();
    let labels: Vec<String> = state.layout.seats().map(|(_, seat)| seat.to_string()).collect();
    // Без Redis просто не видно удержаний
    let held = state.cache.held_seats(id, &labels).await.unwrap_or_else(|e| {
        tracing::warn!(show_id = %id, "failed to read seat holds: {:?}", e);
        BTreeSet::new()
    });

    Ok(Json(build_seat_map(id, &state.layout, &sold, &held)))
}

async fn check_show_input(state: &AppState, input: &ShowInput) -> AppResult<()> {
    input.validate()?;
    if !input.has_valid_times() {
        return Err(AppError::BadRequest("end_time must be after start_time".to_string()));
    }
    if Theater::find(&state.db, input.theater_id).await?.is_none() {
        return Err(AppError::not_found("Theater"));
    }
    Ok(())
}

// POST /api/shows
async fn create_show(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(input): Json<ShowInput>,
) -> AppResult<impl IntoResponse> {
    check_show_input(&state, &input).await?;
    let show = Show::create(&state.db, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Movie"))?;
    tracing::info!(show_id = %show.id, admin = %admin.user_id, "show created");
    Ok((StatusCode::CREATED, Json(show)))
}

// PUT /api/shows/{id}
async fn update_show(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ShowInput>,
) -> AppResult<impl IntoResponse> {
    check_show_input(&state, &input).await?;
    if state.cache.get_movie(input.movie_id).await?.is_none() {
        return Err(AppError::not_found("Movie"));
    }
    let show = Show::update(&state.db, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Show"))?;
    tracing::info!(show_id = %id, admin = %admin.user_id, "show updated");
    Ok(Json(show))
}

// DELETE /api/shows/{id}
async fn delete_show(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !Show::delete(&state.db, id).await? {
        return Err(AppError::not_found("Show"));
    }
    tracing::info!(show_id = %id, admin = %admin.user_id, "show deleted");
    Ok(StatusCode::NO_CONTENT)
}
