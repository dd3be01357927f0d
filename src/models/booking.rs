use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::{is_unique_violation, Database};

pub const STATUS_CONFIRMED: &str = "confirmed";

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub show_id: Uuid,
    pub seat_numbers: Vec<String>,
    pub subtotal: i64,
    pub fees: i64,
    pub total_price: i64,
    pub status: String,
    pub payment_method: String,
    pub payment_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Бронь вместе с данными сеанса для списка «мои брони» и билета.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BookingDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub show_id: Uuid,
    pub seat_numbers: Vec<String>,
    pub subtotal: i64,
    pub fees: i64,
    pub total_price: i64,
    pub status: String,
    pub payment_method: String,
    pub payment_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub movie_title: String,
    pub theater_name: String,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBooking<'a> {
    pub user_id: Uuid,
    pub show_id: Uuid,
    pub seats: &'a [String],
    pub subtotal: i64,
    pub fees: i64,
    pub total_price: i64,
    pub payment_method: &'a str,
    pub payment_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingInsertError {
    #[error("one of the seats is already sold")]
    SeatTaken,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const BOOKING_COLUMNS: &str = "id, user_id, show_id, seat_numbers, subtotal, fees, total_price, \
     status, payment_method, payment_id, created_at";

const DETAILS_SELECT: &str = "SELECT b.id, b.user_id, b.show_id, b.seat_numbers, b.subtotal, b.fees,
            b.total_price, b.status, b.payment_method, b.payment_id, b.created_at,
            m.title AS movie_title, t.name AS theater_name, s.start_time
     FROM bookings b
     JOIN shows s ON s.id = b.show_id
     JOIN movies m ON m.id = s.movie_id
     JOIN theaters t ON t.id = s.theater_id";

impl Booking {
    /// Записывает бронь и её места одной транзакцией.
    /// Повторная продажа места упирается в первичный ключ `booking_seats`.
    pub async fn create(db: &Database, new: NewBooking<'_>) -> Result<Booking, BookingInsertError> {
        let mut tx = db.pool.begin().await?;

        let booking = sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings (id, user_id, show_id, seat_numbers, subtotal, fees, total_price,
                                   status, payment_method, payment_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.show_id)
        .bind(new.seats)
        .bind(new.subtotal)
        .bind(new.fees)
        .bind(new.total_price)
        .bind(STATUS_CONFIRMED)
        .bind(new.payment_method)
        .bind(new.payment_id)
        .fetch_one(&mut *tx)
        .await?;

        let inserted = sqlx::query(
            "INSERT INTO booking_seats (show_id, seat, booking_id)
             SELECT $1, seat, $2 FROM UNNEST($3::TEXT[]) AS seat",
        )
        .bind(new.show_id)
        .bind(booking.id)
        .bind(new.seats)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                tracing::info!(show_id = %new.show_id, "seat already sold, rolling back booking");
                tx.rollback().await?;
                return Err(BookingInsertError::SeatTaken);
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(booking)
    }

    pub async fn for_user(db: &Database, user_id: Uuid) -> Result<Vec<BookingDetails>, sqlx::Error> {
        sqlx::query_as::<_, BookingDetails>(&format!(
            "{DETAILS_SELECT} WHERE b.user_id = $1 ORDER BY b.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&db.pool)
        .await
    }

    pub async fn find(db: &Database, id: Uuid) -> Result<Option<BookingDetails>, sqlx::Error> {
        sqlx::query_as::<_, BookingDetails>(&format!("{DETAILS_SELECT} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }
}
