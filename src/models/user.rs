use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::Database;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub full_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, email, phone_number, full_name, password_hash, is_admin, created_at";

impl User {
    pub async fn find(db: &Database, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    // Email сравниваем без учёта регистра
    pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn create_with_password(
        db: &Database,
        email: &str,
        full_name: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, full_name, password_hash) VALUES ($1, LOWER($2), $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(email.trim())
        .bind(full_name.trim())
        .bind(password_hash)
        .fetch_one(&db.pool)
        .await
    }

    pub async fn grant_admin(db: &Database, id: Uuid) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_admin = TRUE WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&db.pool)
        .await
    }

    /// Пользователь, вошедший по телефону. Повторный вход обновляет имя и email.
    pub async fn upsert_phone_user(
        db: &Database,
        phone_number: &str,
        full_name: &str,
        email: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, phone_number, full_name, email) VALUES ($1, $2, $3, LOWER($4))
             ON CONFLICT (phone_number) DO UPDATE
             SET full_name = EXCLUDED.full_name, email = COALESCE(EXCLUDED.email, users.email)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(phone_number)
        .bind(full_name)
        .bind(email)
        .fetch_one(&db.pool)
        .await
    }
}
