//! Foundational value types shared by the loan and cashback ledgers.

pub mod account;
pub mod loan;
pub mod money;
pub mod payment;
