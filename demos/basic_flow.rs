//! Basic lending flow example.
//!
//! Creates loans, submits and verifies payments, and shows how accrual
//! and cashback respond at each step.

use chrono::{Duration, Utc};
use lending_ledger::prelude::*;
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("╔══════════════════════════════════════════╗");
    println!("║  lending-ledger: Basic Lending Example   ║");
    println!("╚══════════════════════════════════════════╝\n");

    let mut engine = LendingEngine::new(AccountId::new("SYSTEM"));
    let admin = AccountId::new("admin");
    let asha = AccountId::new("asha");

    // --- Scenario 1: Interest-only loan ---
    println!("━━━ Scenario 1: Interest-Only Loan ━━━\n");

    let loan = Loan::new(
        asha.clone(),
        "Shop working capital",
        dec!(50_000),
        dec!(0.21),
        PaymentFrequency::Monthly,
        LoanType::InterestOnly,
    )
    .with_created_at(Utc::now() - Duration::days(30));
    let loan_id = engine.add_loan(loan)?;

    let accrued = engine.accrued(loan_id, Utc::now())?;
    println!("Principal:            50000 @ 21%");
    println!("Accrued (daily):      {}", accrued.daily_basis);
    println!("Accrued (monthly):    {}", accrued.monthly_basis);

    // Overpaying an interest-only loan is refused.
    let err = engine
        .submit_payment(loan_id, dec!(900), Utc::now(), PaymentDetails::default())
        .unwrap_err();
    println!("Paying 900:           refused ({})", err);

    let pid = engine.submit_payment(loan_id, dec!(800), Utc::now(), PaymentDetails::default())?;
    engine.verify_payment(pid, admin.clone())?;
    let accrued = engine.accrued(loan_id, Utc::now())?;
    println!("Paying 800, verified: accrued now {}", accrued.daily_basis);
    println!(
        "Remaining principal:  {} (interest-only, never moves)\n",
        engine.book().loan(loan_id)?.remaining_principal()
    );

    // --- Scenario 2: Regular loan with cashback ---
    println!("━━━ Scenario 2: Regular Loan With Cashback ━━━\n");

    let ravi = AccountId::new("ravi");
    let loan = Loan::new(
        ravi.clone(),
        "Equipment loan",
        dec!(10_000),
        dec!(0.18),
        PaymentFrequency::Daily,
        LoanType::Regular,
    )
    .with_created_at(Utc::now() - Duration::days(1));
    let loan_id = engine.add_loan(loan)?;
    engine.add_loan_cashback_config(loan_id, ravi.clone(), CashbackRate::Percentage(dec!(0.05)))?;

    let pid = engine.submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())?;
    let payment = engine.book().payment(pid)?;
    println!("Payment of 100 split:");
    println!("  Interest:           {}", payment.interest_amount());
    println!("  Principal:          {}", payment.principal_amount());

    engine.verify_payment(pid, admin)?;
    println!(
        "After verification:   remaining {}",
        engine.book().loan(loan_id)?.remaining_principal()
    );
    println!(
        "Cashback for ravi:    {} points",
        engine.cashback().balance(&ravi)
    );

    Ok(())
}
