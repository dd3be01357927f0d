//! Пошаговое оформление брони: дата → кинотеатр/сеанс → места → оплата → готово.
//!
//! Переходы строго линейные. `back()` возвращает на шаг назад и сбрасывает всё,
//! что было выбрано на последующих шагах. В `Success` попасть можно только из
//! `Checkout`, а в `Checkout` только из `Seats` с непустым выбором.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::layout::SeatLayout;
use super::payment::{PaymentError, PaymentKind, PaymentMethod, PaymentReceipt};
use super::pricing::{quote, FeePolicy, PriceBreakdown, PricingError};
use super::seat::SeatId;
use super::selection::{Selection, ToggleOutcome};
use super::Rupees;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    DateTime,
    Cinema,
    Seats,
    Checkout,
    Success,
}

impl WizardStep {
    fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::DateTime => None,
            WizardStep::Cinema => Some(WizardStep::DateTime),
            WizardStep::Seats => Some(WizardStep::Cinema),
            WizardStep::Checkout => Some(WizardStep::Seats),
            WizardStep::Success => None,
        }
    }
}

/// Выбранный сеанс.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowChoice {
    pub show_id: Uuid,
    pub movie_title: String,
    pub theater_name: String,
    pub starts_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("action not allowed on step {current:?}, expected {expected:?}")]
    WrongStep {
        current: WizardStep,
        expected: WizardStep,
    },
    #[error("date {0} is in the past")]
    PastDate(NaiveDate),
    #[error("show starts on {show_date}, but {selected} was selected")]
    ShowOnOtherDate {
        selected: NaiveDate,
        show_date: NaiveDate,
    },
    #[error("select at least one seat")]
    NoSeats,
    #[error("choose a payment method")]
    NoPaymentMethod,
    #[error("cannot go back from {0:?}")]
    NoPreviousStep(WizardStep),
    #[error("paid by {paid}, but {chosen} was chosen")]
    PaymentKindMismatch { chosen: PaymentKind, paid: PaymentKind },
    #[error("paid {paid}, but the total is {expected}")]
    AmountMismatch { expected: Rupees, paid: Rupees },
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Подтверждённая бронь, с которой мастер заканчивает работу.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedBooking {
    pub show: ShowChoice,
    pub seats: Vec<SeatId>,
    pub price: PriceBreakdown,
    pub receipt: PaymentReceipt,
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    layout: Arc<SeatLayout>,
    fees: FeePolicy,
    step: WizardStep,
    date: Option<NaiveDate>,
    show: Option<ShowChoice>,
    selection: Selection,
    quote: Option<PriceBreakdown>,
    payment_method: Option<PaymentMethod>,
    confirmed: Option<ConfirmedBooking>,
    visited: Vec<WizardStep>,
}

impl BookingWizard {
    pub fn new(layout: Arc<SeatLayout>, fees: FeePolicy) -> Self {
        Self {
            layout,
            fees,
            step: WizardStep::DateTime,
            date: None,
            show: None,
            selection: Selection::new(),
            quote: None,
            payment_method: None,
            confirmed: None,
            visited: vec![WizardStep::DateTime],
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn show(&self) -> Option<&ShowChoice> {
        self.show.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn layout(&self) -> &SeatLayout {
        &self.layout
    }

    pub fn payment_method(&self) -> Option<&PaymentMethod> {
        self.payment_method.as_ref()
    }

    pub fn confirmed(&self) -> Option<&ConfirmedBooking> {
        self.confirmed.as_ref()
    }

    /// Шаги, через которые прошёл мастер, по порядку (с учётом возвратов).
    pub fn history(&self) -> &[WizardStep] {
        &self.visited
    }

    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), WizardError> {
        self.expect_step(WizardStep::DateTime)?;
        if date < today {
            return Err(WizardError::PastDate(date));
        }
        self.date = Some(date);
        self.enter(WizardStep::Cinema);
        Ok(())
    }

    pub fn select_show(&mut self, choice: ShowChoice) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Cinema)?;
        let show_date = choice.starts_at.date();
        if let Some(selected) = self.date {
            if selected != show_date {
                return Err(WizardError::ShowOnOtherDate { selected, show_date });
            }
        }
        self.show = Some(choice);
        self.selection.clear();
        self.enter(WizardStep::Seats);
        Ok(())
    }

    pub fn toggle_seat(&mut self, seat: SeatId) -> Result<ToggleOutcome, WizardError> {
        self.expect_step(WizardStep::Seats)?;
        Ok(self.selection.toggle_seat(seat, &self.layout))
    }

    pub fn can_continue(&self) -> bool {
        match self.step {
            WizardStep::DateTime => self.date.is_some(),
            WizardStep::Cinema => self.show.is_some(),
            WizardStep::Seats => self.selection.can_checkout(),
            WizardStep::Checkout => self.payment_method.is_some(),
            WizardStep::Success => false,
        }
    }

    /// Текущий расчёт по выбранным местам (со сборами).
    pub fn current_quote(&self) -> Result<PriceBreakdown, WizardError> {
        Ok(quote(self.selection.seats(), &self.layout, &self.fees)?)
    }

    pub fn proceed_to_checkout(&mut self) -> Result<PriceBreakdown, WizardError> {
        self.expect_step(WizardStep::Seats)?;
        if !self.selection.can_checkout() {
            return Err(WizardError::NoSeats);
        }
        let breakdown = self.current_quote()?;
        self.quote = Some(breakdown.clone());
        self.enter(WizardStep::Checkout);
        Ok(breakdown)
    }

    pub fn choose_payment(&mut self, method: PaymentMethod) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Checkout)?;
        method.validate()?;
        self.payment_method = Some(method);
        Ok(())
    }

    /// Сумма к оплате на шаге оформления.
    pub fn amount_due(&self) -> Option<Rupees> {
        match self.step {
            WizardStep::Checkout => self.quote.as_ref().map(|q| q.total),
            _ => None,
        }
    }

    pub fn complete_payment(&mut self, receipt: PaymentReceipt) -> Result<&ConfirmedBooking, WizardError> {
        self.expect_step(WizardStep::Checkout)?;
        let (Some(show), Some(price)) = (self.show.clone(), self.quote.clone()) else {
            return Err(WizardError::NoSeats);
        };
        let chosen = self
            .payment_method
            .as_ref()
            .map(PaymentMethod::kind)
            .ok_or(WizardError::NoPaymentMethod)?;
        if receipt.kind != chosen {
            return Err(WizardError::PaymentKindMismatch {
                chosen,
                paid: receipt.kind,
            });
        }
        if receipt.amount != price.total {
            return Err(WizardError::AmountMismatch {
                expected: price.total,
                paid: receipt.amount,
            });
        }
        let confirmed = ConfirmedBooking {
            show,
            seats: self.selection.seats().copied().collect(),
            price,
            receipt,
        };
        self.enter(WizardStep::Success);
        let confirmed = self.confirmed.insert(confirmed);
        Ok(&*confirmed)
    }

    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        let previous = self
            .step
            .previous()
            .ok_or(WizardError::NoPreviousStep(self.step))?;
        match self.step {
            WizardStep::Cinema => {
                self.date = None;
            }
            WizardStep::Seats => {
                self.show = None;
                self.selection.clear();
            }
            WizardStep::Checkout => {
                self.quote = None;
                self.payment_method = None;
            }
            WizardStep::DateTime | WizardStep::Success => {}
        }
        self.enter(previous);
        Ok(previous)
    }

    fn enter(&mut self, step: WizardStep) {
        self.step = step;
        self.visited.push(step);
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                current: self.step,
                expected,
            })
        }
    }
}
