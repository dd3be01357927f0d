use serde::{Deserialize, Serialize};

use super::layout::{LayoutError, SeatLayout, SeatTier};
use super::seat::SeatId;
use super::Rupees;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("cannot price seat {seat}: {source}")]
    Unpriced {
        seat: SeatId,
        #[source]
        source: LayoutError,
    },
}

/// Сумма цен категорий по выбранным местам, без сборов.
///
/// Место вне схемы зала даёт ошибку, а не нулевую цену.
pub fn compute_total<'a, I>(seats: I, layout: &SeatLayout) -> Result<Rupees, PricingError>
where
    I: IntoIterator<Item = &'a SeatId>,
{
    seats.into_iter().try_fold(0, |sum, seat| {
        let tier = layout
            .tier_of(seat)
            .map_err(|source| PricingError::Unpriced { seat: *seat, source })?;
        Ok(sum + tier.price)
    })
}

/// Сервисный сбор и налог поверх стоимости билетов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    pub convenience_fee: Rupees,
    pub tax_percent: u32,
}

impl FeePolicy {
    pub const fn none() -> Self {
        Self { convenience_fee: 0, tax_percent: 0 }
    }

    /// Сбор 50 рупий и 18% GST.
    pub const fn standard() -> Self {
        Self { convenience_fee: 50, tax_percent: 18 }
    }

    /// Налог считается от стоимости билетов и округляется до целого (половина вверх).
    pub fn tax_on(&self, subtotal: Rupees) -> Rupees {
        (subtotal * self.tax_percent as Rupees + 50) / 100
    }

    pub fn apply(&self, subtotal: Rupees, seat_count: usize) -> PriceBreakdown {
        if seat_count == 0 {
            return PriceBreakdown::default();
        }
        let tax = self.tax_on(subtotal);
        PriceBreakdown {
            seat_count,
            subtotal,
            convenience_fee: self.convenience_fee,
            tax,
            total: subtotal + self.convenience_fee + tax,
            lines: Vec::new(),
        }
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLine {
    pub tier: SeatTier,
    pub name: String,
    pub unit_price: Rupees,
    pub seats: Vec<SeatId>,
    pub amount: Rupees,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub seat_count: usize,
    pub subtotal: Rupees,
    pub convenience_fee: Rupees,
    pub tax: Rupees,
    /// Итог к оплате.
    pub total: Rupees,
    pub lines: Vec<TierLine>,
}

/// Полный расчёт для страницы оплаты: строки по категориям, сборы, итог.
pub fn quote<'a, I>(seats: I, layout: &SeatLayout, fees: &FeePolicy) -> Result<PriceBreakdown, PricingError>
where
    I: IntoIterator<Item = &'a SeatId>,
{
    let mut lines: Vec<TierLine> = Vec::new();
    let mut count = 0;
    for seat in seats {
        let tier = layout
            .tier_of(seat)
            .map_err(|source| PricingError::Unpriced { seat: *seat, source })?;
        count += 1;
        match lines.iter_mut().find(|l| l.tier == tier.tier) {
            Some(line) => {
                line.seats.push(*seat);
                line.amount += tier.price;
            }
            None => lines.push(TierLine {
                tier: tier.tier,
                name: tier.tier.display_name().to_string(),
                unit_price: tier.price,
                seats: vec![*seat],
                amount: tier.price,
            }),
        }
    }

    for line in &mut lines {
        line.seats.sort();
    }
    lines.sort_by_key(|l| l.tier);

    let subtotal = lines.iter().map(|l| l.amount).sum();
    let mut breakdown = fees.apply(subtotal, count);
    breakdown.lines = lines;
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::seat::parse_seat_list;

    #[test]
    fn test_two_royal_seats() {
        let layout = SeatLayout::standard();
        let seats = parse_seat_list(&["C5", "C6"]).unwrap();
        assert_eq!(compute_total(&seats, &layout).unwrap(), 800);

        let breakdown = quote(&seats, &layout, &FeePolicy::standard()).unwrap();
        assert_eq!(breakdown.subtotal, 800);
        assert_eq!(breakdown.convenience_fee, 50);
        assert_eq!(breakdown.tax, 144);
        assert_eq!(breakdown.total, 994);
        assert_eq!(breakdown.lines.len(), 1);
        assert_eq!(breakdown.lines[0].tier, SeatTier::Royal);
    }

    #[test]
    fn test_mixed_tiers_without_fees() {
        let layout = SeatLayout::standard();
        let seats = parse_seat_list(&["J1", "A1", "C1"]).unwrap();
        let breakdown = quote(&seats, &layout, &FeePolicy::none()).unwrap();
        assert_eq!(breakdown.total, 620 + 400 + 380);
        let tiers: Vec<SeatTier> = breakdown.lines.iter().map(|l| l.tier).collect();
        assert_eq!(tiers, vec![SeatTier::RoyalRecliner, SeatTier::Royal, SeatTier::Club]);
    }

    #[test]
    fn test_empty_selection_costs_nothing() {
        let layout = SeatLayout::standard();
        let breakdown = quote(std::iter::empty(), &layout, &FeePolicy::standard()).unwrap();
        assert_eq!(breakdown, PriceBreakdown::default());
    }

    #[test]
    fn test_tax_rounds_half_up() {
        let fees = FeePolicy { convenience_fee: 0, tax_percent: 18 };
        // 380 * 0.18 = 68.4
        assert_eq!(fees.tax_on(380), 68);
        // 25 * 0.18 = 4.5
        assert_eq!(fees.tax_on(25), 5);
    }

    #[test]
    fn test_unknown_row_fails() {
        let layout = SeatLayout::standard();
        let seats = parse_seat_list(&["C5", "Q1"]).unwrap();
        let err = compute_total(&seats, &layout).unwrap_err();
        assert!(matches!(
            err,
            PricingError::Unpriced { source: LayoutError::UnknownRow('Q'), .. }
        ));
    }
}
