//! Cashback redemption workflow example.
//!
//! Shows the append-only point ledger, transfers, and the
//! request / complete / cancel redemption lifecycle.

use lending_ledger::prelude::*;
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("╔══════════════════════════════════════════╗");
    println!("║  lending-ledger: Redemption Example      ║");
    println!("╚══════════════════════════════════════════╝\n");

    let mut engine = LendingEngine::new(AccountId::new("SYSTEM"));
    let admin = AccountId::new("admin");
    let asha = AccountId::new("asha");
    let ravi = AccountId::new("ravi");

    engine.grant_points(asha.clone(), dec!(2_000), Some("signup bonus".into()), admin.clone())?;
    engine.transfer_points(asha.clone(), ravi.clone(), dec!(300), None)?;
    println!("asha balance:  {}", engine.cashback().balance(&asha));
    println!("ravi balance:  {}\n", engine.cashback().balance(&ravi));

    // --- Gift card redemption: denominations of 500 only ---
    println!("━━━ Amazon Gift Card ━━━\n");
    let err = engine
        .request_redemption(
            asha.clone(),
            dec!(750),
            RedemptionType::AmazonGiftCard,
            PayoutDetails::default(),
        )
        .unwrap_err();
    println!("Requesting 750:  refused ({})", err);

    let gift = engine.request_redemption(
        asha.clone(),
        dec!(500),
        RedemptionType::AmazonGiftCard,
        PayoutDetails::default(),
    )?;
    println!(
        "Requesting 500:  ok, balance now {} (debited up front)\n",
        engine.cashback().balance(&asha)
    );

    // --- Bank transfer, later cancelled ---
    println!("━━━ Cancelled Bank Transfer ━━━\n");
    let payout = PayoutDetails {
        account_name: Some("Asha K".into()),
        account_number: Some("00112233".into()),
        ifsc_code: Some("EXMP0001234".into()),
        ..PayoutDetails::default()
    };
    let bank = engine.request_redemption(
        asha.clone(),
        dec!(1_000),
        RedemptionType::BankTransfer,
        payout,
    )?;
    println!("Requested 1000:  balance {}", engine.cashback().balance(&asha));

    engine.cancel_redemption(bank, admin.clone(), Some("customer changed mind".into()))?;
    println!(
        "Cancelled:       balance {} (refunded via new ledger row)",
        engine.cashback().balance(&asha)
    );

    engine.complete_redemption(gift, admin, Some("card emailed".into()))?;
    println!("\nGift card completed. Ledger rows:");
    for tx in engine.cashback().transactions() {
        println!(
            "  {:<18} {:>8} → {}",
            tx.transaction_type().to_string(),
            tx.points(),
            tx.to()
        );
    }

    Ok(())
}
