//! Билет, который показывается после оплаты.
//!
//! Код билета не проверяется сервером: это base64url от JSON с данными брони
//! и короткая контрольная сумма, чтобы сканер отличал испорченный код.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Rupees;

const CHECKSUM_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPayload {
    pub booking_id: String,
    pub movie_title: String,
    pub theater_name: String,
    pub seats: String,
    pub date: String,
    pub time: String,
    pub total_price: Rupees,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error("ticket code is malformed")]
    Malformed,
    #[error("ticket code checksum mismatch")]
    ChecksumMismatch,
}

impl TicketPayload {
    pub fn new(
        booking_id: impl Into<String>,
        movie_title: impl Into<String>,
        theater_name: impl Into<String>,
        seats: &[String],
        starts_at: NaiveDateTime,
        total_price: Rupees,
    ) -> Self {
        Self {
            booking_id: booking_id.into(),
            movie_title: movie_title.into(),
            theater_name: theater_name.into(),
            seats: seats.join(", "),
            date: starts_at.format("%d/%m/%Y").to_string(),
            time: starts_at.format("%I:%M %p").to_string(),
            total_price,
        }
    }

    pub fn encode(&self) -> String {
        // Сериализация плоской структуры из строк и чисел не падает.
        let json = serde_json::to_vec(self).unwrap_or_default();
        let body = URL_SAFE_NO_PAD.encode(&json);
        format!("{body}.{}", checksum(body.as_bytes()))
    }

    pub fn decode(code: &str) -> Result<Self, TicketError> {
        let (body, sum) = code.trim().rsplit_once('.').ok_or(TicketError::Malformed)?;
        if checksum(body.as_bytes()) != sum {
            return Err(TicketError::ChecksumMismatch);
        }
        let json = URL_SAFE_NO_PAD.decode(body).map_err(|_| TicketError::Malformed)?;
        serde_json::from_slice(&json).map_err(|_| TicketError::Malformed)
    }
}

fn checksum(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = format!("{digest:x}");
    hex.truncate(CHECKSUM_LEN);
    hex
}

/// Номер брони, который создаётся на клиенте без сервера: `BS-<unix millis>`.
pub fn local_booking_reference(now: DateTime<Utc>) -> String {
    format!("BS-{}", now.timestamp_millis())
}
