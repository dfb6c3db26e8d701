//! Spread Evaluation Benchmarks - Per-Tick Domain Cost
//!
//! Benchmarks the pure functions every tick runs after its quotes
//! arrive: spread evaluation, the alert decision, and message rendering.
//!
//! Run with: cargo bench --bench spread_bench

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal_macros::dec;

use gold_spread_monitor::adapters::notify::MessageComposer;
use gold_spread_monitor::domain::alert::AlertStateMachine;
use gold_spread_monitor::domain::quote::{Observation, Quote};
use gold_spread_monitor::domain::spread::{MidpointBasis, SpreadEvaluator};

fn quotes() -> (Quote, Quote) {
    (
        Quote::new(dec!(148390.00), dec!(148210.00)).unwrap(),
        Quote::new(dec!(4600.25), dec!(4590.50))
            .unwrap()
            .scaled(dec!(31.1035))
            .unwrap(),
    )
}

/// Benchmark the three evaluation branches.
fn bench_evaluate(c: &mut Criterion) {
    let evaluator = SpreadEvaluator::new(MidpointBasis::VenueABid);
    let (a, b) = quotes();

    c.bench_function("spread_evaluate", |bench| {
        bench.iter(|| evaluator.evaluate(black_box(&a), black_box(&b)));
    });

    let overlap_a = Quote::new(dec!(100.00), dec!(99.90)).unwrap();
    let overlap_b = Quote::new(dec!(100.05), dec!(99.95)).unwrap();
    let true_mid = SpreadEvaluator::new(MidpointBasis::TrueMid);
    c.bench_function("spread_evaluate_overlap_true_mid", |bench| {
        bench.iter(|| true_mid.evaluate(black_box(&overlap_a), black_box(&overlap_b)));
    });
}

/// Benchmark a propose/commit cycle on an open alert.
fn bench_alert_decision(c: &mut Criterion) {
    let evaluator = SpreadEvaluator::default();
    let (a, b) = quotes();
    let observation = Observation::new(Utc::now(), a, b);
    let spread = evaluator.evaluate(&a, &b).unwrap();

    c.bench_function("alert_propose_commit", |bench| {
        bench.iter(|| {
            let mut machine = AlertStateMachine::default();
            let transition = machine.propose(black_box(&observation), black_box(&spread));
            machine.commit(transition);
        });
    });
}

/// Benchmark subject/body rendering for one event.
fn bench_compose(c: &mut Criterion) {
    let a = Quote::new(dec!(100.00), dec!(99.90)).unwrap();
    let b = Quote::new(dec!(100.40), dec!(100.30)).unwrap();
    let timestamp = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 5).unwrap();
    let observation = Observation::new(timestamp, a, b);
    let spread = SpreadEvaluator::default().evaluate(&a, &b).unwrap();

    let mut machine = AlertStateMachine::default();
    let Some(event) = machine.advance(&observation, &spread) else {
        panic!("crossed quotes must open an alert");
    };
    let composer = MessageComposer::new("PAXG", "Gold Spot", chrono_tz::Europe::Istanbul);

    c.bench_function("alert_message_compose", |bench| {
        bench.iter(|| composer.compose(black_box(&event)));
    });
}

criterion_group!(benches, bench_evaluate, bench_alert_decision, bench_compose);
criterion_main!(benches);
