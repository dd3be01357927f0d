use serde::Serialize;
use std::collections::BTreeSet;

use super::layout::SeatLayout;
use super::seat::SeatId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Место закрыто для продажи, выбор не изменился.
    Unavailable,
    /// Такого места нет в зале, выбор не изменился.
    OutsideLayout,
}

impl ToggleOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, ToggleOutcome::Added | ToggleOutcome::Removed)
    }
}

/// Выбранные, но ещё не оплаченные места. Живёт только пока идёт оформление.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    seats: BTreeSet<SeatId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_seat(&mut self, seat: SeatId, layout: &SeatLayout) -> ToggleOutcome {
        if self.seats.remove(&seat) {
            return ToggleOutcome::Removed;
        }
        if !layout.contains(&seat) {
            return ToggleOutcome::OutsideLayout;
        }
        if layout.is_unavailable(&seat) {
            return ToggleOutcome::Unavailable;
        }
        self.seats.insert(seat);
        ToggleOutcome::Added
    }

    pub fn contains(&self, seat: &SeatId) -> bool {
        self.seats.contains(seat)
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Кнопка "продолжить" активна только при непустом выборе.
    pub fn can_checkout(&self) -> bool {
        !self.is_empty()
    }

    pub fn seats(&self) -> impl Iterator<Item = &SeatId> {
        self.seats.iter()
    }

    pub fn labels(&self) -> Vec<String> {
        self.seats.iter().map(ToString::to_string).collect()
    }

    pub fn clear(&mut self) {
        self.seats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(s: &str) -> SeatId {
        s.parse().unwrap()
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let layout = SeatLayout::standard();
        let mut selection = Selection::new();
        assert!(!selection.can_checkout());

        assert_eq!(selection.toggle_seat(seat("C5"), &layout), ToggleOutcome::Added);
        assert!(selection.can_checkout());
        assert_eq!(selection.toggle_seat(seat("C5"), &layout), ToggleOutcome::Removed);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_unavailable_and_foreign_seats_are_ignored() {
        let layout = SeatLayout::standard();
        let mut selection = Selection::new();
        selection.toggle_seat(seat("A1"), &layout);
        let before = selection.clone();

        assert_eq!(selection.toggle_seat(seat("D5"), &layout), ToggleOutcome::Unavailable);
        assert_eq!(selection.toggle_seat(seat("Z1"), &layout), ToggleOutcome::OutsideLayout);
        assert_eq!(selection.toggle_seat(seat("A42"), &layout), ToggleOutcome::OutsideLayout);
        assert_eq!(selection, before);
    }

    #[test]
    fn test_labels_are_sorted() {
        let layout = SeatLayout::standard();
        let mut selection = Selection::new();
        for s in ["C6", "A2", "C5"] {
            selection.toggle_seat(seat(s), &layout);
        }
        assert_eq!(selection.labels(), vec!["A2", "C5", "C6"]);
    }
}
