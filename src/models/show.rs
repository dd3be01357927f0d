use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::database::Database;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Show {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub language: Option<String>,
    /// Базовая цена сеанса, показывается в расписании.
    pub price: i64,
}

/// Сеанс вместе с фильмом и кинотеатром, как его отдаёт API.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ShowDetails {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub language: Option<String>,
    pub price: i64,
    pub movie_title: String,
    pub movie_duration: i32,
    pub theater_name: String,
    pub theater_city: String,
    pub theater_location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowFilter {
    pub movie_id: Option<Uuid>,
    pub theater_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShowInput {
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    #[validate(length(min = 1, max = 50))]
    pub language: Option<String>,
    #[validate(range(min = 0))]
    pub price: i64,
}

impl ShowInput {
    pub fn has_valid_times(&self) -> bool {
        self.end_time.is_none_or(|end| end > self.start_time)
    }
}

const DETAILS_SELECT: &str = "SELECT s.id, s.movie_id, s.theater_id, s.start_time, s.end_time, s.language, s.price,
            m.title AS movie_title, m.duration_minutes AS movie_duration,
            t.name AS theater_name, t.city AS theater_city, t.location AS theater_location
     FROM shows s
     JOIN movies m ON m.id = s.movie_id
     JOIN theaters t ON t.id = s.theater_id";

const SHOW_COLUMNS: &str = "id, movie_id, theater_id, start_time, end_time, language, price";

// $2 - фильм, $4 - начало, $5 - конец из запроса
const END_TIME_SQL: &str =
    "COALESCE($5, $4 + make_interval(mins => (SELECT duration_minutes FROM movies WHERE id = $2)))";

fn insert_sql() -> String {
    format!(
        "INSERT INTO shows (id, movie_id, theater_id, start_time, end_time, language, price)
         SELECT $1, m.id, $3, $4, {END_TIME_SQL}, $6, $7
         FROM movies m WHERE m.id = $2
         RETURNING {SHOW_COLUMNS}"
    )
}

fn update_sql() -> String {
    format!(
        "UPDATE shows
         SET movie_id = $2, theater_id = $3, start_time = $4, end_time = {END_TIME_SQL}, language = $6, price = $7
         WHERE id = $1
         RETURNING {SHOW_COLUMNS}"
    )
}

impl ShowDetails {
    pub async fn list(db: &Database, filter: &ShowFilter) -> Result<Vec<ShowDetails>, sqlx::Error> {
        sqlx::query_as::<_, ShowDetails>(&format!(
            "{DETAILS_SELECT}
             WHERE ($1::UUID IS NULL OR s.movie_id = $1)
               AND ($2::UUID IS NULL OR s.theater_id = $2)
               AND ($3::DATE IS NULL OR s.start_time::DATE = $3)
             ORDER BY s.start_time, t.name"
        ))
        .bind(filter.movie_id)
        .bind(filter.theater_id)
        .bind(filter.date)
        .fetch_all(&db.pool)
        .await
    }

    pub async fn find(db: &Database, id: Uuid) -> Result<Option<ShowDetails>, sqlx::Error> {
        sqlx::query_as::<_, ShowDetails>(&format!("{DETAILS_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }
}

impl Show {
    /// Создаёт сеанс. Если конец не указан, он считается по длительности фильма
    /// (так же и при обновлении).
    /// `None`, если фильма нет.
    pub async fn create(db: &Database, input: &ShowInput) -> Result<Option<Show>, sqlx::Error> {
        sqlx::query_as::<_, Show>(&insert_sql())
            .bind(Uuid::new_v4())
            .bind(input.movie_id)
            .bind(input.theater_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.language)
            .bind(input.price)
            .fetch_optional(&db.pool)
            .await
    }

    pub async fn update(db: &Database, id: Uuid, input: &ShowInput) -> Result<Option<Show>, sqlx::Error> {
        sqlx::query_as::<_, Show>(&update_sql())
            .bind(id)
            .bind(input.movie_id)
            .bind(input.theater_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.language)
            .bind(input.price)
            .fetch_optional(&db.pool)
            .await
    }

    pub async fn delete(db: &Database, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM shows WHERE id = $1")
            .bind(id)
            .execute(&db.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Места, уже проданные на сеанс.
    pub async fn sold_seats(db: &Database, show_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT seat FROM booking_seats WHERE show_id = $1 ORDER BY seat")
            .bind(show_id)
            .fetch_all(&db.pool)
            .await
    }
}
