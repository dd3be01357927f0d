use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Rupees;

pub const UPI_APPS: [(&str, &str); 4] = [
    ("gpay", "Google Pay"),
    ("phonepe", "PhonePe"),
    ("paytm", "Paytm"),
    ("bhim", "BHIM UPI"),
];

pub const BANKS: [(&str, &str); 4] = [
    ("sbi", "SBI"),
    ("hdfc", "HDFC"),
    ("icici", "ICICI"),
    ("bob", "Bank of Baroda"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Card,
    Upi,
    NetBanking,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Card => "card",
            PaymentKind::Upi => "upi",
            PaymentKind::NetBanking => "netbanking",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Способ оплаты, выбранный на шаге оформления.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethod {
    Card {
        card_number: String,
        expiry: String,
        cvc: String,
        name: String,
    },
    Upi {
        app: String,
    },
    #[serde(rename = "netbanking")]
    NetBanking {
        bank: String,
    },
}

// Номер карты и CVC в логи не попадают.
impl fmt::Debug for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("please select a bank")]
    MissingBank,
    #[error("unsupported bank '{0}'")]
    UnknownBank(String),
    #[error("please select a UPI app")]
    MissingUpiApp,
    #[error("unsupported UPI app '{0}'")]
    UnknownUpiApp(String),
    #[error("invalid card: {0}")]
    InvalidCard(&'static str),
    #[error("payment amount must be positive, got {0}")]
    InvalidAmount(Rupees),
}

impl PaymentMethod {
    pub fn kind(&self) -> PaymentKind {
        match self {
            PaymentMethod::Card { .. } => PaymentKind::Card,
            PaymentMethod::Upi { .. } => PaymentKind::Upi,
            PaymentMethod::NetBanking { .. } => PaymentKind::NetBanking,
        }
    }

    pub fn validate(&self) -> Result<(), PaymentError> {
        match self {
            PaymentMethod::NetBanking { bank } => {
                if bank.trim().is_empty() {
                    return Err(PaymentError::MissingBank);
                }
                lookup(&BANKS, bank).ok_or_else(|| PaymentError::UnknownBank(bank.clone()))?;
            }
            PaymentMethod::Upi { app } => {
                if app.trim().is_empty() {
                    return Err(PaymentError::MissingUpiApp);
                }
                lookup(&UPI_APPS, app).ok_or_else(|| PaymentError::UnknownUpiApp(app.clone()))?;
            }
            PaymentMethod::Card { card_number, expiry, cvc, name } => {
                let digits: String = card_number.chars().filter(|c| !c.is_whitespace()).collect();
                if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(PaymentError::InvalidCard("card number must have 12-19 digits"));
                }
                if !valid_expiry(expiry) {
                    return Err(PaymentError::InvalidCard("expiry must be MM/YY"));
                }
                if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
                    return Err(PaymentError::InvalidCard("cvc must have 3 or 4 digits"));
                }
                if name.trim().is_empty() {
                    return Err(PaymentError::InvalidCard("cardholder name is required"));
                }
            }
        }
        Ok(())
    }

    /// Короткое описание для чека: `Card •••• 4242`, `UPI (Google Pay)`, `Net Banking (HDFC)`.
    pub fn summary(&self) -> String {
        match self {
            PaymentMethod::Card { card_number, .. } => {
                let digits: Vec<char> = card_number.chars().filter(char::is_ascii_digit).collect();
                let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
                format!("Card •••• {tail}")
            }
            PaymentMethod::Upi { app } => {
                format!("UPI ({})", lookup(&UPI_APPS, app).unwrap_or(app.as_str()))
            }
            PaymentMethod::NetBanking { bank } => {
                format!("Net Banking ({})", lookup(&BANKS, bank).unwrap_or(bank.as_str()))
            }
        }
    }
}

fn lookup<'a>(table: &'a [(&'a str, &'a str)], id: &str) -> Option<&'a str> {
    let id = id.trim();
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(id))
        .map(|(_, name)| *name)
}

fn valid_expiry(expiry: &str) -> bool {
    let Some((mm, yy)) = expiry.trim().split_once('/') else {
        return false;
    };
    let month_ok = mm.len() == 2 && matches!(mm.parse::<u8>(), Ok(1..=12));
    let year_ok = yy.len() == 2 && yy.chars().all(|c| c.is_ascii_digit());
    month_ok && year_ok
}

/// Подтверждение успешной (симулированной) оплаты.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: Uuid,
    pub kind: PaymentKind,
    pub method_summary: String,
    pub amount: Rupees,
    pub processed_at: DateTime<Utc>,
}

impl PaymentReceipt {
    pub fn issue(method: &PaymentMethod, amount: Rupees) -> Result<Self, PaymentError> {
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(amount));
        }
        method.validate()?;
        Ok(Self {
            payment_id: Uuid::new_v4(),
            kind: method.kind(),
            method_summary: method.summary(),
            amount,
            processed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> PaymentMethod {
        PaymentMethod::Card {
            card_number: "4242 4242 4242 4242".into(),
            expiry: "12/29".into(),
            cvc: "123".into(),
            name: "Asha Rao".into(),
        }
    }

    #[test]
    fn test_bank_and_upi_must_be_selected() {
        let bank = PaymentMethod::NetBanking { bank: "".into() };
        assert_eq!(bank.validate(), Err(PaymentError::MissingBank));
        let upi = PaymentMethod::Upi { app: " ".into() };
        assert_eq!(upi.validate(), Err(PaymentError::MissingUpiApp));
        let upi = PaymentMethod::Upi { app: "venmo".into() };
        assert_eq!(upi.validate(), Err(PaymentError::UnknownUpiApp("venmo".into())));

        assert!(PaymentMethod::NetBanking { bank: "HDFC".into() }.validate().is_ok());
        assert!(PaymentMethod::Upi { app: "gpay".into() }.validate().is_ok());
    }

    #[test]
    fn test_card_checks() {
        assert!(card().validate().is_ok());

        let PaymentMethod::Card { card_number, expiry, cvc, name } = card() else {
            unreachable!()
        };
        let bad_expiry = PaymentMethod::Card {
            card_number: card_number.clone(),
            expiry: "13/29".into(),
            cvc: cvc.clone(),
            name: name.clone(),
        };
        assert!(matches!(bad_expiry.validate(), Err(PaymentError::InvalidCard(_))));

        let short = PaymentMethod::Card { card_number: "4242".into(), expiry, cvc, name };
        assert!(matches!(short.validate(), Err(PaymentError::InvalidCard(_))));
    }

    #[test]
    fn test_debug_masks_card() {
        let printed = format!("{:?}", card());
        assert_eq!(printed, "Card •••• 4242");
        assert!(!printed.contains("4242 4242"));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::json!({"method": "netbanking", "bank": "sbi"});
        let method: PaymentMethod = serde_json::from_value(json).unwrap();
        assert_eq!(method.kind(), PaymentKind::NetBanking);
        assert_eq!(method.summary(), "Net Banking (SBI)");
    }

    #[test]
    fn test_receipt_requires_positive_amount() {
        assert_eq!(
            PaymentReceipt::issue(&card(), 0),
            Err(PaymentError::InvalidAmount(0))
        );
        let receipt = PaymentReceipt::issue(&card(), 994).unwrap();
        assert_eq!(receipt.amount, 994);
        assert_eq!(receipt.kind, PaymentKind::Card);
    }
}
