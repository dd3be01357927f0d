use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::seat::SeatId;
use super::Rupees;

/// Категория места. Цена и ряды задаются в [`SeatLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatTier {
    RoyalRecliner,
    Royal,
    Club,
}

impl SeatTier {
    pub const ALL: [SeatTier; 3] = [SeatTier::RoyalRecliner, SeatTier::Royal, SeatTier::Club];

    pub fn display_name(&self) -> &'static str {
        match self {
            SeatTier::RoyalRecliner => "Royal Recliner",
            SeatTier::Royal => "Royal",
            SeatTier::Club => "Club",
        }
    }

    pub fn is_vip(&self) -> bool {
        matches!(self, SeatTier::RoyalRecliner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRows {
    pub tier: SeatTier,
    pub price: Rupees,
    pub rows: Vec<char>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("row {0} is assigned to more than one tier")]
    DuplicateRow(char),
    #[error("tier {0:?} is listed more than once")]
    DuplicateTier(SeatTier),
    #[error("tier {0:?} has no rows")]
    EmptyTier(SeatTier),
    #[error("tier {0:?} has a negative price")]
    NegativePrice(SeatTier),
    #[error("seats per row must be positive")]
    EmptyRows,
    #[error("row {0} does not belong to any tier")]
    UnknownRow(char),
    #[error("seat {0} is outside the hall")]
    OutsideLayout(SeatId),
}

/// Схема зала: ряды, разбитые на ценовые категории, и статически закрытые места.
///
/// Отображение ряд → категория строится один раз в [`SeatLayout::new`] и
/// проверяется там же, поэтому любой ряд либо принадлежит ровно одной
/// категории, либо поиск возвращает [`LayoutError::UnknownRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatLayout {
    tiers: Vec<TierRows>,
    row_index: BTreeMap<char, usize>,
    seats_per_row: u16,
    unavailable: BTreeSet<SeatId>,
}

impl SeatLayout {
    pub fn new(
        tiers: Vec<TierRows>,
        seats_per_row: u16,
        unavailable: impl IntoIterator<Item = SeatId>,
    ) -> Result<Self, LayoutError> {
        if seats_per_row == 0 {
            return Err(LayoutError::EmptyRows);
        }

        let mut row_index = BTreeMap::new();
        let mut seen_tiers = BTreeSet::new();
        for (idx, tier) in tiers.iter().enumerate() {
            if !seen_tiers.insert(tier.tier) {
                return Err(LayoutError::DuplicateTier(tier.tier));
            }
            if tier.rows.is_empty() {
                return Err(LayoutError::EmptyTier(tier.tier));
            }
            if tier.price < 0 {
                return Err(LayoutError::NegativePrice(tier.tier));
            }
            for row in &tier.rows {
                let row = row.to_ascii_uppercase();
                if row_index.insert(row, idx).is_some() {
                    return Err(LayoutError::DuplicateRow(row));
                }
            }
        }

        let mut layout = Self {
            tiers,
            row_index,
            seats_per_row,
            unavailable: BTreeSet::new(),
        };
        for seat in unavailable {
            layout.check_in_hall(&seat)?;
            layout.unavailable.insert(seat);
        }
        Ok(layout)
    }

    /// Стандартный зал: Royal Recliner A–B по 620, Royal C–F по 400,
    /// Club G–J по 380, 10 мест в ряду, D5 и F2 проданы заранее.
    pub fn standard() -> Self {
        let tiers = vec![
            TierRows { tier: SeatTier::RoyalRecliner, price: 620, rows: vec!['A', 'B'] },
            TierRows { tier: SeatTier::Royal, price: 400, rows: vec!['C', 'D', 'E', 'F'] },
            TierRows { tier: SeatTier::Club, price: 380, rows: vec!['G', 'H', 'I', 'J'] },
        ];
        let unavailable = [SeatId::new('D', 5), SeatId::new('F', 2)]
            .into_iter()
            .flatten();
        match Self::new(tiers, 10, unavailable) {
            Ok(layout) => layout,
            Err(e) => unreachable!("standard layout is valid: {e}"),
        }
    }

    pub fn tiers(&self) -> &[TierRows] {
        &self.tiers
    }

    pub fn seats_per_row(&self) -> u16 {
        self.seats_per_row
    }

    pub fn unavailable(&self) -> &BTreeSet<SeatId> {
        &self.unavailable
    }

    pub fn is_unavailable(&self, seat: &SeatId) -> bool {
        self.unavailable.contains(seat)
    }

    pub fn tier_of_row(&self, row: char) -> Result<&TierRows, LayoutError> {
        self.row_index
            .get(&row.to_ascii_uppercase())
            .map(|&idx| &self.tiers[idx])
            .ok_or(LayoutError::UnknownRow(row))
    }

    pub fn tier_of(&self, seat: &SeatId) -> Result<&TierRows, LayoutError> {
        self.check_in_hall(seat)?;
        self.tier_of_row(seat.row())
    }

    pub fn contains(&self, seat: &SeatId) -> bool {
        self.check_in_hall(seat).is_ok()
    }

    /// Все места зала по порядку: категория, ряд, номер.
    pub fn seats(&self) -> impl Iterator<Item = (SeatTier, SeatId)> + '_ {
        self.tiers.iter().flat_map(move |tier| {
            tier.rows.iter().flat_map(move |&row| {
                (1..=self.seats_per_row)
                    .filter_map(move |n| SeatId::new(row, n).ok())
                    .map(move |seat| (tier.tier, seat))
            })
        })
    }

    pub fn capacity(&self) -> usize {
        self.row_index.len() * self.seats_per_row as usize
    }

    fn check_in_hall(&self, seat: &SeatId) -> Result<(), LayoutError> {
        if !self.row_index.contains_key(&seat.row()) {
            return Err(LayoutError::UnknownRow(seat.row()));
        }
        if seat.number() > self.seats_per_row {
            return Err(LayoutError::OutsideLayout(*seat));
        }
        Ok(())
    }
}

impl Default for SeatLayout {
    fn default() -> Self {
        Self::standard()
    }
}
