use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Идентификатор места в зале: буква ряда + номер, например `C5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatId {
    row: char,
    number: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatParseError {
    #[error("seat id is empty")]
    Empty,
    #[error("seat row must be a letter A-Z, got '{0}'")]
    InvalidRow(char),
    #[error("seat number '{0}' is not a positive integer")]
    InvalidNumber(String),
}

impl SeatId {
    pub fn new(row: char, number: u16) -> Result<Self, SeatParseError> {
        let row = row.to_ascii_uppercase();
        if !row.is_ascii_uppercase() {
            return Err(SeatParseError::InvalidRow(row));
        }
        if number == 0 {
            return Err(SeatParseError::InvalidNumber(number.to_string()));
        }
        Ok(Self { row, number })
    }

    pub fn row(&self) -> char {
        self.row
    }

    pub fn number(&self) -> u16 {
        self.number
    }
}

impl FromStr for SeatId {
    type Err = SeatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let row = chars.next().ok_or(SeatParseError::Empty)?;
        let digits = chars.as_str();
        let number = digits
            .parse::<u16>()
            .map_err(|_| SeatParseError::InvalidNumber(digits.to_string()))?;
        Self::new(row, number)
    }
}

impl TryFrom<String> for SeatId {
    type Error = SeatParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatId> for String {
    fn from(seat: SeatId) -> Self {
        seat.to_string()
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

/// Разбирает список вида `["C5", "C6"]`, останавливаясь на первой ошибке.
pub fn parse_seat_list<S: AsRef<str>>(raw: &[S]) -> Result<Vec<SeatId>, SeatParseError> {
    raw.iter().map(|s| s.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let seat: SeatId = "C5".parse().unwrap();
        assert_eq!(seat.row(), 'C');
        assert_eq!(seat.number(), 5);
        assert_eq!(seat.to_string(), "C5");

        let lower: SeatId = " j10 ".parse().unwrap();
        assert_eq!(lower.to_string(), "J10");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<SeatId>(), Err(SeatParseError::Empty));
        assert_eq!("5C".parse::<SeatId>(), Err(SeatParseError::InvalidRow('5')));
        assert!(matches!("C".parse::<SeatId>(), Err(SeatParseError::InvalidNumber(_))));
        assert!(matches!("C0".parse::<SeatId>(), Err(SeatParseError::InvalidNumber(_))));
        assert!(matches!("C-1".parse::<SeatId>(), Err(SeatParseError::InvalidNumber(_))));
    }

    #[test]
    fn test_serde_as_string() {
        let seat = SeatId::new('d', 12).unwrap();
        let json = serde_json::to_string(&seat).unwrap();
        assert_eq!(json, "\"D12\"");
        let back: SeatId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seat);
        assert!(serde_json::from_str::<SeatId>("\"??\"").is_err());
    }

    #[test]
    fn test_ordering_is_row_then_number() {
        let mut seats = parse_seat_list(&["C10", "A2", "C9"]).unwrap();
        seats.sort();
        let labels: Vec<String> = seats.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["A2", "C9", "C10"]);
    }
}
