//! Оформление брони с клиента.
//!
//! Если сервер не принял бронь по любой причине, кроме занятого места,
//! пользователь всё равно видит экран успеха: бронь сохраняется локально
//! с `persisted = false` в списке `guest_bookings`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::store::{LocalStore, LocalStoreExt, StoreError};
use super::{ApiClient, ClientError};
use crate::booking::ticket::local_booking_reference;
use crate::booking::{BookingWizard, ConfirmedBooking, PaymentReceipt, Rupees, TicketPayload, WizardError, WizardStep};
use crate::controllers::bookings::{CheckoutRequest, CheckoutResponse};

pub const GUEST_BOOKINGS_KEY: &str = "guest_bookings";

/// Бронь, которую сервер не подтвердил. Это не резервирование места.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestBooking {
    pub reference: String,
    pub show_id: Uuid,
    pub movie_title: String,
    pub theater_name: String,
    pub seats: Vec<String>,
    pub starts_at: NaiveDateTime,
    pub total_price: Rupees,
    pub payment_method: String,
    pub ticket_code: String,
    pub created_at: DateTime<Utc>,
    pub persisted: bool,
    pub reason: String,
}

impl GuestBooking {
    fn from_confirmed(confirmed: &ConfirmedBooking, reason: String, now: DateTime<Utc>) -> Self {
        let reference = local_booking_reference(now);
        let seats: Vec<String> = confirmed.seats.iter().map(|s| s.to_string()).collect();
        let ticket = TicketPayload::new(
            reference.clone(),
            &confirmed.show.movie_title,
            &confirmed.show.theater_name,
            &seats,
            confirmed.show.starts_at,
            confirmed.price.total,
        );
        Self {
            ticket_code: ticket.encode(),
            reference,
            show_id: confirmed.show.show_id,
            movie_title: confirmed.show.movie_title.clone(),
            theater_name: confirmed.show.theater_name.clone(),
            seats,
            starts_at: confirmed.show.starts_at,
            total_price: confirmed.price.total,
            payment_method: confirmed.receipt.method_summary.clone(),
            created_at: now,
            persisted: false,
            reason,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    Confirmed(Box<CheckoutResponse>),
    Local(GuestBooking),
}

impl CheckoutOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, CheckoutOutcome::Confirmed(_))
    }
}

/// Локальные брони, новые первыми.
pub fn guest_bookings<S: LocalStore + ?Sized>(store: &S) -> Result<Vec<GuestBooking>, StoreError> {
    Ok(store.get_json(GUEST_BOOKINGS_KEY)?.unwrap_or_default())
}

fn record_guest_booking<S: LocalStore + ?Sized>(store: &S, booking: &GuestBooking) -> Result<(), StoreError> {
    let mut bookings = guest_bookings(store)?;
    bookings.insert(0, booking.clone());
    store.set_json(GUEST_BOOKINGS_KEY, &bookings)
}

/// Отправляет бронь с шага оформления.
///
/// Конфликт мест возвращается ошибкой, мастер остаётся на шаге оформления.
/// Остальные ошибки сервера дают локальную бронь.
pub async fn submit_checkout<S: LocalStore + ?Sized>(
    client: &ApiClient,
    store: &S,
    wizard: &mut BookingWizard,
) -> Result<CheckoutOutcome, ClientError> {
    if wizard.step() != WizardStep::Checkout {
        return Err(WizardError::WrongStep {
            current: wizard.step(),
            expected: WizardStep::Checkout,
        }
        .into());
    }
    let (Some(show), Some(method), Some(amount)) =
        (wizard.show().cloned(), wizard.payment_method().cloned(), wizard.amount_due())
    else {
        return Err(WizardError::NoPaymentMethod.into());
    };

    let request = CheckoutRequest {
        show_id: show.show_id,
        seats: wizard.selection().labels(),
        payment: method.clone(),
    };

    match client.create_booking(&request).await {
        Ok(response) => {
            wizard.complete_payment(response.receipt.clone())?;
            info!(booking_id = %response.booking.id, "booking confirmed by server");
            Ok(CheckoutOutcome::Confirmed(Box::new(response)))
        }
        Err(e) if e.is_conflict() => Err(e),
        Err(e) => {
            warn!(show_id = %show.show_id, "booking not saved on server, keeping it locally: {}", e);
            let receipt = PaymentReceipt::issue(&method, amount).map_err(WizardError::from)?;
            let confirmed = wizard.complete_payment(receipt)?;
            let booking = GuestBooking::from_confirmed(confirmed, e.to_string(), Utc::now());
            record_guest_booking(store, &booking)?;
            Ok(CheckoutOutcome::Local(booking))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{PaymentMethod, PriceBreakdown, SeatId, ShowChoice};
    use crate::client::store::MemoryStore;
    use chrono::NaiveDate;

    fn confirmed() -> ConfirmedBooking {
        let method = PaymentMethod::Upi { app: "gpay".into() };
        ConfirmedBooking {
            show: ShowChoice {
                show_id: Uuid::new_v4(),
                movie_title: "Kalki 2898 AD".into(),
                theater_name: "PVR Select City".into(),
                starts_at: NaiveDate::from_ymd_opt(2026, 11, 2)
                    .unwrap()
                    .and_hms_opt(18, 30, 0)
                    .unwrap(),
            },
            seats: vec![SeatId::new('C', 5).unwrap(), SeatId::new('C', 6).unwrap()],
            price: PriceBreakdown {
                total: 994,
                ..PriceBreakdown::default()
            },
            receipt: PaymentReceipt::issue(&method, 994).unwrap(),
        }
    }

    #[test]
    fn test_guest_booking_is_marked_local() {
        let now = Utc::now();
        let booking = GuestBooking::from_confirmed(&confirmed(), "request timed out".into(), now);

        assert!(!booking.persisted);
        assert_eq!(booking.reference, format!("BS-{}", now.timestamp_millis()));
        assert_eq!(booking.seats, vec!["C5", "C6"]);
        assert_eq!(booking.total_price, 994);

        let ticket = TicketPayload::decode(&booking.ticket_code).unwrap();
        assert_eq!(ticket.booking_id, booking.reference);
        assert_eq!(ticket.seats, "C5, C6");
    }

    #[test]
    fn test_newest_guest_booking_first() {
        let store = MemoryStore::new();
        let first = GuestBooking::from_confirmed(&confirmed(), "first".into(), Utc::now());
        let second = GuestBooking::from_confirmed(&confirmed(), "second".into(), Utc::now());

        record_guest_booking(&store, &first).unwrap();
        record_guest_booking(&store, &second).unwrap();

        let reasons: Vec<String> = guest_bookings(&store).unwrap().into_iter().map(|b| b.reason).collect();
        assert_eq!(reasons, vec!["second", "first"]);
    }
}
