//! # lending-ledger
//!
//! Ledger core for a small interest-bearing lending operation.
//!
//! Tracks loans, splits each payment between interest and principal at
//! submission time, runs the pending/verified approval workflow that is the
//! only code path allowed to mutate loan balances, and keeps an append-only
//! cashback points ledger whose balances are derived by aggregation rather
//! than stored.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: money/day-count arithmetic, accounts, loans, payments
//! - **ledger** — Interest accrual and the loan book (payments, verification, splitting)
//! - **cashback** — Append-only points ledger, cashback configs, redemption workflow
//! - **engine** — `LendingEngine` facade tying verification to cashback auto-grants
//! - **simulation** — Random portfolio generation for stress testing

pub mod cashback;
pub mod core;
pub mod engine;
pub mod ledger;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::cashback::config::{
        CashbackRate, ConfigId, LoanCashbackConfig, TrackerCashbackConfig,
    };
    pub use crate::cashback::ledger::{CashbackError, CashbackLedger};
    pub use crate::cashback::redemption::{
        CashbackRedemption, PayoutDetails, RedemptionError, RedemptionId, RedemptionType,
    };
    pub use crate::cashback::transaction::{CashbackTransaction, TransactionType};
    pub use crate::core::account::AccountId;
    pub use crate::core::loan::{Loan, LoanId, LoanType, PaymentFrequency};
    pub use crate::core::payment::{Payment, PaymentId, PaymentStatus};
    pub use crate::engine::LendingEngine;
    pub use crate::ledger::accrual::{accrued_interest, AccruedInterest};
    pub use crate::ledger::book::{LedgerError, LoanBook, PaymentDetails, VerifyOutcome};
}
