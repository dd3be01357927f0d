use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::database::Database;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Theater {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TheaterInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[serde(default)]
    #[validate(length(max = 300))]
    pub location: String,
}

impl Theater {
    pub async fn all(db: &Database, city: Option<&str>) -> Result<Vec<Theater>, sqlx::Error> {
        sqlx::query_as::<_, Theater>(
            "SELECT id, name, city, location FROM theaters
             WHERE $1::TEXT IS NULL OR LOWER(city) = LOWER($1)
             ORDER BY name",
        )
        .bind(city)
        .fetch_all(&db.pool)
        .await
    }

    pub async fn find(db: &Database, id: Uuid) -> Result<Option<Theater>, sqlx::Error> {
        sqlx::query_as::<_, Theater>("SELECT id, name, city, location FROM theaters WHERE id = $1")
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    pub async fn create(db: &Database, input: &TheaterInput) -> Result<Theater, sqlx::Error> {
        sqlx::query_as::<_, Theater>(
            "INSERT INTO theaters (id, name, city, location) VALUES ($1, $2, $3, $4)
             RETURNING id, name, city, location",
        )
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(input.city.trim())
        .bind(input.location.trim())
        .fetch_one(&db.pool)
        .await
    }

    pub async fn update(db: &Database, id: Uuid, input: &TheaterInput) -> Result<Option<Theater>, sqlx::Error> {
        sqlx::query_as::<_, Theater>(
            "UPDATE theaters SET name = $2, city = $3, location = $4 WHERE id = $1
             RETURNING id, name, city, location",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.city.trim())
        .bind(input.location.trim())
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn delete(db: &Database, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM theaters WHERE id = $1")
            .bind(id)
            .execute(&db.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
