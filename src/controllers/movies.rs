use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::catalog::{facets, split_list, MovieFilter, MovieSort};
use crate::error::{AppError, AppResult};
use crate::middleware::AdminUser;
use crate::models::{Movie, MovieInput};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/facets", get(movie_facets))
        .route("/movies/{id}", get(get_movie).put(update_movie).delete(delete_movie))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoviesQuery {
    pub q: Option<String>,
    /// Через запятую: `Action,Drama`
    pub genres: Option<String>,
    pub languages: Option<String>,
    pub sort: Option<MovieSort>,
}

impl From<MoviesQuery> for MovieFilter {
    fn from(query: MoviesQuery) -> Self {
        MovieFilter {
            genres: split_list(query.genres.as_deref()),
            languages: split_list(query.languages.as_deref()),
            query: query.q,
            sort: query.sort.unwrap_or_default(),
        }
    }
}

// GET /api/movies
async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MoviesQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = MovieFilter::from(params);
    let movies = state.cache.get_movies().await?;
    Ok(Json(filter.apply(movies)))
}

// GET /api/movies/facets
async fn movie_facets(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let movies = state.cache.get_movies().await?;
    Ok(Json(facets(&movies)))
}

// GET /api/movies/{id}
async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let movie = state
        .cache
        .get_movie(id)
        .await?
        .ok_or_else(|| AppError::not_found("Movie"))?;
    Ok(Json(movie))
}

// POST /api/movies
async fn create_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(input): Json<MovieInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let movie = Movie::create(&state.db, &input).await?;
    state.cache.invalidate_movies().await;
    tracing::info!(movie_id = %movie.id, admin = %admin.user_id, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

// PUT /api/movies/{id}
async fn update_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(input): Json<MovieInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let movie = Movie::update(&state.db, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Movie"))?;
    state.cache.invalidate_movies().await;
    tracing::info!(movie_id = %id, admin = %admin.user_id, "movie updated");
    Ok(Json(movie))
}

// DELETE /api/movies/{id}
async fn delete_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !Movie::delete(&state.db, id).await? {
        return Err(AppError::not_found("Movie"));
    }
    state.cache.invalidate_movies().await;
    tracing::info!(movie_id = %id, admin = %admin.user_id, "movie deleted");
    Ok(StatusCode::NO_CONTENT)
}
