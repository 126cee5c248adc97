use criterion::{black_box, criterion_group, criterion_main, Criterion};
use chrono::Utc;
use lending_ledger::simulation::portfolio::{generate_random_portfolio, PortfolioConfig};

fn bench_replay_25_loans(c: &mut Criterion) {
    let portfolio = generate_random_portfolio(&PortfolioConfig {
        loan_count: 25,
        avg_payments_per_loan: 4,
        ..Default::default()
    });

    c.bench_function("replay_25_loans", |b| {
        b.iter(|| black_box(&portfolio).build().unwrap())
    });
}

fn bench_replay_500_loans(c: &mut Criterion) {
    let portfolio = generate_random_portfolio(&PortfolioConfig {
        customer_count: 50,
        loan_count: 500,
        avg_payments_per_loan: 6,
        ..Default::default()
    });

    c.bench_function("replay_500_loans", |b| {
        b.iter(|| black_box(&portfolio).build().unwrap())
    });
}

fn bench_accrual_500_loans(c: &mut Criterion) {
    let portfolio = generate_random_portfolio(&PortfolioConfig {
        customer_count: 50,
        loan_count: 500,
        avg_payments_per_loan: 6,
        ..Default::default()
    });
    let engine = portfolio.build().unwrap();
    let now = Utc::now();
    let ids: Vec<_> = engine.book().loans().map(|l| l.id()).collect();

    c.bench_function("accrual_500_loans", |b| {
        b.iter(|| {
            for id in &ids {
                black_box(engine.accrued(*id, now).unwrap());
            }
        })
    });
}

fn bench_balance_derivation(c: &mut Criterion) {
    let portfolio = generate_random_portfolio(&PortfolioConfig {
        customer_count: 50,
        loan_count: 500,
        avg_payments_per_loan: 6,
        ..Default::default()
    });
    let engine = portfolio.build().unwrap();
    let accounts: Vec<_> = engine
        .book()
        .loans()
        .map(|l| l.customer().clone())
        .collect();

    c.bench_function("balance_derivation", |b| {
        b.iter(|| {
            for account in &accounts {
                black_box(engine.cashback().balance(account));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_replay_25_loans,
    bench_replay_500_loans,
    bench_accrual_500_loans,
    bench_balance_derivation
);
criterion_main!(benches);
