use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::booking::{
    quote, seat::parse_seat_list, BookingWizard, PaymentMethod, PaymentReceipt, PriceBreakdown, SeatId,
    SeatLayout, Selection, ShowChoice, TicketPayload, ToggleOutcome,
};
use crate::cache::HoldOutcome;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Booking, BookingDetails, NewBooking, ShowDetails};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/quote", post(quote_seats))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/ticket", get(get_ticket))
}

/* ---------- helpers ---------- */

/// Разбирает места и отсекает повторы: повторный toggle снял бы место.
fn parse_unique_seats(raw: &[String]) -> AppResult<Vec<SeatId>> {
    let seats = parse_seat_list(raw)?;
    let unique: BTreeSet<SeatId> = seats.iter().copied().collect();
    if unique.len() != seats.len() {
        return Err(AppError::BadRequest("Seat list contains duplicates".to_string()));
    }
    Ok(seats)
}

fn rejected_seat(seat: SeatId, outcome: ToggleOutcome) -> Option<AppError> {
    match outcome {
        ToggleOutcome::Added => None,
        ToggleOutcome::Unavailable => Some(AppError::BadRequest(format!("Seat {seat} is not available"))),
        ToggleOutcome::OutsideLayout => Some(AppError::BadRequest(format!("Seat {seat} does not exist"))),
        ToggleOutcome::Removed => Some(AppError::BadRequest(format!("Seat {seat} is listed twice"))),
    }
}

fn select_all(layout: &SeatLayout, seats: &[SeatId]) -> AppResult<Selection> {
    let mut selection = Selection::new();
    for &seat in seats {
        if let Some(err) = rejected_seat(seat, selection.toggle_seat(seat, layout)) {
            return Err(err);
        }
    }
    Ok(selection)
}

fn ensure_owner(user: &AuthUser, booking: &BookingDetails) -> AppResult<()> {
    if booking.user_id != user.user_id && !user.is_admin {
        return Err(AppError::Forbidden("Booking does not belong to you".to_string()));
    }
    Ok(())
}

fn ticket_for(booking: &BookingDetails) -> TicketPayload {
    TicketPayload::new(
        booking.id.to_string(),
        &booking.movie_title,
        &booking.theater_name,
        &booking.seat_numbers,
        booking.start_time,
        booking.total_price,
    )
}

/* ---------- QUOTE ---------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub seats: Vec<String>,
}

// POST /api/bookings/quote
async fn quote_seats(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> AppResult<Json<PriceBreakdown>> {
    let seats = parse_unique_seats(&req.seats)?;
    let selection = select_all(&state.layout, &seats)?;
    Ok(Json(quote(selection.seats(), &state.layout, &state.fees)?))
}

/* ---------- CHECKOUT ---------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub show_id: Uuid,
    pub seats: Vec<String>,
    pub payment: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub booking: BookingDetails,
    pub price: PriceBreakdown,
    pub receipt: PaymentReceipt,
    pub ticket: TicketPayload,
    pub ticket_code: String,
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<impl IntoResponse> {
    let seats = parse_unique_seats(&req.seats)?;
    let show = ShowDetails::find(&state.db, req.show_id)
        .await?
        .ok_or_else(|| AppError::not_found("Show"))?;

    // Тот же мастер, что и на клиенте: дата → сеанс → места → оплата
    let mut wizard = BookingWizard::new(state.layout.clone(), state.fees);
    let today = state.config.booking.theater_today(Utc::now());
    wizard.select_date(show.start_time.date(), today)?;
    wizard.select_show(ShowChoice {
        show_id: show.id,
        movie_title: show.movie_title.clone(),
        theater_name: show.theater_name.clone(),
        starts_at: show.start_time,
    })?;
    for &seat in &seats {
        if let Some(err) = rejected_seat(seat, wizard.toggle_seat(seat)?) {
            return Err(err);
        }
    }
    let price = wizard.proceed_to_checkout()?;
    wizard.choose_payment(req.payment.clone())?;

    let labels = wizard.selection().labels();
    let checkout_id = Uuid::new_v4();
    let held = match state
        .cache
        .hold_seats(show.id, &labels, checkout_id, state.config.booking.hold_ttl_secs)
        .await
    {
        Ok(HoldOutcome::Held) => true,
        Ok(HoldOutcome::Taken(seat)) => {
            return Err(AppError::Conflict(format!("Seat {seat} is being booked by someone else")));
        }
        Err(e) => {
            // Без удержаний дубль всё равно отсечёт БД
            tracing::warn!(show_id = %show.id, "seat holds unavailable: {:?}", e);
            false
        }
    };

    let result = pay_and_persist(&state, &user, &show, &mut wizard, &req.payment, &labels, price).await;

    if held {
        state.cache.release_seats(show.id, &labels, checkout_id).await;
    }

    let response = result?;
    tracing::info!(
        booking_id = %response.booking.id,
        user_id = %user.user_id,
        show_id = %show.id,
        seats = %labels.join(","),
        total = response.price.total,
        "booking confirmed"
    );
    Ok((StatusCode::CREATED, Json(response)))
}

async fn pay_and_persist(
    state: &AppState,
    user: &AuthUser,
    show: &ShowDetails,
    wizard: &mut BookingWizard,
    method: &PaymentMethod,
    labels: &[String],
    price: PriceBreakdown,
) -> AppResult<CheckoutResponse> {
    let receipt = state.payments.process(method, price.total).await?;
    let confirmed = wizard.complete_payment(receipt)?.clone();

    let booking = Booking::create(
        &state.db,
        NewBooking {
            user_id: user.user_id,
            show_id: show.id,
            seats: labels,
            subtotal: confirmed.price.subtotal,
            fees: confirmed.price.convenience_fee + confirmed.price.tax,
            total_price: confirmed.price.total,
            payment_method: confirmed.receipt.kind.as_str(),
            payment_id: confirmed.receipt.payment_id,
        },
    )
    .await?;

    let details = BookingDetails {
        id: booking.id,
        user_id: booking.user_id,
        show_id: booking.show_id,
        seat_numbers: booking.seat_numbers,
        subtotal: booking.subtotal,
        fees: booking.fees,
        total_price: booking.total_price,
        status: booking.status,
        payment_method: booking.payment_method,
        payment_id: booking.payment_id,
        created_at: booking.created_at,
        movie_title: show.movie_title.clone(),
        theater_name: show.theater_name.clone(),
        start_time: show.start_time,
    };
    let ticket = ticket_for(&details);

    Ok(CheckoutResponse {
        ticket_code: ticket.encode(),
        ticket,
        price: confirmed.price,
        receipt: confirmed.receipt,
        booking: details,
    })
}

/* ---------- READ ---------- */

// GET /api/bookings
async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    Ok(Json(Booking::for_user(&state.db, user.user_id).await?))
}

// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let booking = Booking::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))?;
    ensure_owner(&user, &booking)?;
    Ok(Json(booking))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponse {
    pub ticket: TicketPayload,
    pub code: String,
}

// GET /api/bookings/{id}/ticket
async fn get_ticket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let booking = Booking::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))?;
    ensure_owner(&user, &booking)?;
    let ticket = ticket_for(&booking);
    Ok(Json(TicketResponse {
        code: ticket.encode(),
        ticket,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duplicates_are_rejected() {
        assert!(parse_unique_seats(&labels(&["C5", "C6"])).is_ok());
        let err = parse_unique_seats(&labels(&["C5", "c5"])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_select_all_rejects_unavailable_and_unknown() {
        let layout = SeatLayout::standard();
        let ok = parse_unique_seats(&labels(&["C5", "C6"])).unwrap();
        assert_eq!(select_all(&layout, &ok).unwrap().len(), 2);

        let blocked = parse_unique_seats(&labels(&["C5", "D5"])).unwrap();
        let err = select_all(&layout, &blocked).unwrap_err();
        assert_eq!(err.to_string(), "Seat D5 is not available");

        let outside = parse_unique_seats(&labels(&["A11"])).unwrap();
        let err = select_all(&layout, &outside).unwrap_err();
        assert_eq!(err.to_string(), "Seat A11 does not exist");
    }
}
