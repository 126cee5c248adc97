//! Cashback points: the append-only transaction ledger, per-loan reward
//! configuration, and the redemption workflow.

pub mod config;
pub mod ledger;
pub mod redemption;
pub mod transaction;
