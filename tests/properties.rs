use chrono::NaiveDate;
use proptest::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use showsphere::auth::{LoginError, LoginFlow, LoginStep};
use showsphere::booking::{
    compute_total, quote, BookingWizard, FeePolicy, PaymentMethod, PaymentReceipt, SeatId, SeatLayout, Selection,
    ShowChoice, ToggleOutcome, WizardStep,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn show() -> ShowChoice {
    ShowChoice {
        show_id: Uuid::new_v4(),
        movie_title: "Pushpa 2".into(),
        theater_name: "INOX Nehru Place".into(),
        starts_at: today().and_hms_opt(21, 0, 0).unwrap(),
    }
}

fn any_seat() -> impl Strategy<Value = SeatId> {
    (prop::sample::select(('A'..='J').collect::<Vec<_>>()), 1u16..=10)
        .prop_map(|(row, n)| SeatId::new(row, n).unwrap())
}

fn open_seat() -> impl Strategy<Value = SeatId> {
    let layout = SeatLayout::standard();
    any_seat().prop_filter("seat is blocked", move |seat| !layout.is_unavailable(seat))
}

#[derive(Debug, Clone)]
enum Action {
    Date,
    Show,
    Toggle(SeatId),
    Checkout,
    Pay,
    Back,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Date),
        Just(Action::Show),
        any_seat().prop_map(Action::Toggle),
        Just(Action::Checkout),
        Just(Action::Pay),
        Just(Action::Back),
    ]
}

proptest! {
    #[test]
    fn unavailable_seat_never_selected(seats in prop::collection::vec(open_seat(), 0..20)) {
        let layout = SeatLayout::standard();
        let mut selection = Selection::new();
        for seat in seats {
            selection.toggle_seat(seat, &layout);
        }
        let before = selection.labels();
        for blocked in layout.unavailable().clone() {
            prop_assert_eq!(selection.toggle_seat(blocked, &layout), ToggleOutcome::Unavailable);
        }
        prop_assert_eq!(selection.labels(), before);
    }

    #[test]
    fn double_toggle_restores_selection(
        seats in prop::collection::vec(open_seat(), 0..20),
        seat in open_seat(),
    ) {
        let layout = SeatLayout::standard();
        let mut selection = Selection::new();
        for s in seats {
            selection.toggle_seat(s, &layout);
        }
        let before = selection.labels();
        let first = selection.toggle_seat(seat, &layout);
        let second = selection.toggle_seat(seat, &layout);
        prop_assert!(first.changed() && second.changed());
        prop_assert_ne!(first, second);
        prop_assert_eq!(selection.labels(), before);
    }

    #[test]
    fn total_ignores_selection_order(seats in prop::collection::vec(open_seat(), 0..30)) {
        let layout = SeatLayout::standard();
        let forward = compute_total(seats.iter(), &layout).unwrap();
        let reversed: Vec<SeatId> = seats.iter().rev().copied().collect();
        prop_assert_eq!(compute_total(reversed.iter(), &layout).unwrap(), forward);

        let expected: i64 = seats.iter().map(|s| layout.tier_of(s).unwrap().price).sum();
        prop_assert_eq!(forward, expected);
    }

    #[test]
    fn success_requires_seats_and_checkout(actions in prop::collection::vec(action(), 0..40)) {
        let mut wizard = BookingWizard::new(Arc::new(SeatLayout::standard()), FeePolicy::standard());
        let upi = PaymentMethod::Upi { app: "phonepe".into() };

        for action in actions {
            let _ = match action {
                Action::Date => wizard.select_date(today(), today()).map(|_| ()),
                Action::Show => wizard.select_show(show()).map(|_| ()),
                Action::Toggle(seat) => wizard.toggle_seat(seat).map(|_| ()),
                Action::Checkout => wizard.proceed_to_checkout().map(|_| ()),
                Action::Pay => {
                    let _ = wizard.choose_payment(upi.clone());
                    match wizard.amount_due() {
                        Some(amount) => wizard
                            .complete_payment(PaymentReceipt::issue(&upi, amount).unwrap())
                            .map(|_| ()),
                        None => Ok(()),
                    }
                }
                Action::Back => wizard.back().map(|_| ()),
            };

            if wizard.step() == WizardStep::Success {
                let history = wizard.history();
                prop_assert!(history.contains(&WizardStep::Seats));
                prop_assert!(history.contains(&WizardStep::Checkout));
                let confirmed = wizard.confirmed().unwrap();
                prop_assert!(!confirmed.seats.is_empty());
                prop_assert_eq!(confirmed.receipt.amount, confirmed.price.total);
            }
        }
    }

    #[test]
    fn only_ten_digit_numbers_pass(digits in "[0-9]{0,13}") {
        let mut flow = LoginFlow::new();
        let result = flow.submit_phone_number(&digits);
        if digits.len() == 10 {
            prop_assert_eq!(result, Ok(LoginStep::Verify));
            prop_assert_eq!(flow.phone(), digits.as_str());
        } else {
            prop_assert_eq!(result, Err(LoginError::InvalidPhone));
            prop_assert_eq!(flow.step(), LoginStep::Phone);
        }
    }
}

#[test]
fn empty_selection_disables_checkout() {
    let selection = Selection::new();
    assert!(!selection.can_checkout());
    assert_eq!(quote(selection.seats(), &SeatLayout::standard(), &FeePolicy::standard()).unwrap().total, 0);
}

#[test]
fn two_royal_seats_cost_994_with_fees() {
    let layout = SeatLayout::standard();
    let seats: Vec<SeatId> = vec!["C5".parse().unwrap(), "C6".parse().unwrap()];
    assert_eq!(compute_total(seats.iter(), &layout).unwrap(), 800);

    let breakdown = quote(seats.iter(), &layout, &FeePolicy::standard()).unwrap();
    assert_eq!(breakdown.convenience_fee, 50);
    assert_eq!(breakdown.tax, 144);
    assert_eq!(breakdown.total, 994);
}

#[test]
fn nine_digit_number_is_rejected() {
    let mut flow = LoginFlow::new();
    flow.enter_phone("987654321");
    assert!(!flow.can_continue());
    assert_eq!(flow.submit_phone(), Err(LoginError::InvalidPhone));

    flow.enter_phone("9876543210");
    assert!(flow.can_continue());
    assert_eq!(flow.submit_phone(), Ok(LoginStep::Verify));
}
