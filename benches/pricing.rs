use criterion::{black_box, criterion_group, criterion_main, Criterion};

use showsphere::booking::{compute_total, quote, FeePolicy, SeatId, SeatLayout, Selection};

fn full_hall(layout: &SeatLayout) -> Vec<SeatId> {
    layout
        .seats()
        .map(|(_, seat)| seat)
        .filter(|seat| !layout.is_unavailable(seat))
        .collect()
}

fn bench_pricing(c: &mut Criterion) {
    let layout = SeatLayout::standard();
    let fees = FeePolicy::standard();
    let seats = full_hall(&layout);
    let pair: Vec<SeatId> = vec!["C5".parse().unwrap(), "C6".parse().unwrap()];

    c.bench_function("compute_total_pair", |b| {
        b.iter(|| compute_total(black_box(&pair).iter(), &layout))
    });
    c.bench_function("compute_total_full_hall", |b| {
        b.iter(|| compute_total(black_box(&seats).iter(), &layout))
    });
    c.bench_function("quote_full_hall", |b| {
        b.iter(|| quote(black_box(&seats).iter(), &layout, &fees))
    });
    c.bench_function("toggle_full_hall", |b| {
        b.iter(|| {
            let mut selection = Selection::new();
            for &seat in black_box(&seats) {
                selection.toggle_seat(seat, &layout);
            }
            selection.len()
        })
    });
}

criterion_group!(benches, bench_pricing);
criterion_main!(benches);
