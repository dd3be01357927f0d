//! Оформление брони: схема зала, выбор мест, расчёт цены, мастер шагов, билет.

pub mod layout;
pub mod payment;
pub mod pricing;
pub mod seat;
pub mod selection;
pub mod ticket;
pub mod wizard;

/// Суммы храним в целых рупиях.
pub type Rupees = i64;

pub use layout::{LayoutError, SeatLayout, SeatTier, TierRows};
pub use payment::{PaymentError, PaymentKind, PaymentMethod, PaymentReceipt};
pub use pricing::{compute_total, quote, FeePolicy, PriceBreakdown, PricingError};
pub use seat::{SeatId, SeatParseError};
pub use selection::{Selection, ToggleOutcome};
pub use ticket::TicketPayload;
pub use wizard::{BookingWizard, ConfirmedBooking, ShowChoice, WizardError, WizardStep};
