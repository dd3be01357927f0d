use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::database::Database;

pub const DEFAULT_CERTIFICATION: &str = "UA";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub languages: Vec<String>,
    pub genres: Vec<String>,
    pub rating: Option<f64>,
    pub certification: String,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Тело POST/PUT для админки.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MovieInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: i32,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub rating: Option<f64>,
    #[validate(length(min = 1, max = 16))]
    pub certification: Option<String>,
    #[validate(url)]
    pub poster_url: Option<String>,
    #[validate(url)]
    pub trailer_url: Option<String>,
    pub release_date: Option<NaiveDate>,
}

const MOVIE_COLUMNS: &str = "id, title, description, duration_minutes, languages, genres, rating, \
     certification, poster_url, trailer_url, release_date, created_at";

impl Movie {
    pub async fn all(db: &Database) -> Result<Vec<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY rating DESC NULLS LAST, title"
        ))
        .fetch_all(&db.pool)
        .await
    }

    pub async fn find(db: &Database, id: Uuid) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"))
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    pub async fn create(db: &Database, input: &MovieInput) -> Result<Movie, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!(
            "INSERT INTO movies (id, title, description, duration_minutes, languages, genres, rating,
                                 certification, poster_url, trailer_url, release_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {MOVIE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.duration_minutes)
        .bind(&input.languages)
        .bind(&input.genres)
        .bind(input.rating)
        .bind(input.certification.as_deref().unwrap_or(DEFAULT_CERTIFICATION))
        .bind(&input.poster_url)
        .bind(&input.trailer_url)
        .bind(input.release_date)
        .fetch_one(&db.pool)
        .await
    }

    pub async fn update(db: &Database, id: Uuid, input: &MovieInput) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!(
            "UPDATE movies
             SET title = $2, description = $3, duration_minutes = $4, languages = $5, genres = $6,
                 rating = $7, certification = $8, poster_url = $9, trailer_url = $10, release_date = $11
             WHERE id = $1
             RETURNING {MOVIE_COLUMNS}"
        ))
        .bind(id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.duration_minutes)
        .bind(&input.languages)
        .bind(&input.genres)
        .bind(input.rating)
        .bind(input.certification.as_deref().unwrap_or(DEFAULT_CERTIFICATION))
        .bind(&input.poster_url)
        .bind(&input.trailer_url)
        .bind(input.release_date)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn delete(db: &Database, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&db.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> MovieInput {
        MovieInput {
            title: "Kantara Chapter-1".into(),
            description: None,
            duration_minutes: 168,
            languages: vec!["Kannada".into()],
            genres: vec!["Action".into(), "Drama".into()],
            rating: Some(8.7),
            certification: Some("UA 16+".into()),
            poster_url: Some("https://img.example.com/kantara.jpg".into()),
            trailer_url: None,
            release_date: None,
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_invalid_input() {
        let mut bad = input();
        bad.title = String::new();
        bad.duration_minutes = 0;
        bad.rating = Some(11.0);
        bad.poster_url = Some("not a url".into());
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("duration_minutes"));
        assert!(fields.contains_key("rating"));
        assert!(fields.contains_key("poster_url"));
    }
}
