//! Portfolio generation utilities.
//!
//! Generates random loan books with payment histories to exercise accrual
//! and verification throughput, and replays serialized portfolios into a
//! live engine.

use crate::cashback::config::CashbackRate;
use crate::core::account::AccountId;
use crate::core::loan::{Loan, LoanId, LoanType, PaymentFrequency};
use crate::core::money::interest_for_days;
use crate::engine::LendingEngine;
use crate::ledger::book::{LedgerError, PaymentDetails};
use chrono::{Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors arising while replaying a serialized portfolio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("loan_index {index} out of range, portfolio has {loan_count} loans")]
    LoanIndexOutOfRange { index: usize, loan_count: usize },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Configuration for generating a random loan portfolio.
#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    /// Number of distinct customers.
    pub customer_count: usize,
    /// Number of loans.
    pub loan_count: usize,
    /// Average number of payments per loan.
    pub avg_payments_per_loan: usize,
    /// Minimum loan principal.
    pub min_principal: Decimal,
    /// Maximum loan principal.
    pub max_principal: Decimal,
    /// Maximum loan age in days.
    pub max_age_days: i64,
    /// Fraction of payments marked verified.
    pub verify_ratio: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            customer_count: 10,
            loan_count: 25,
            avg_payments_per_loan: 4,
            min_principal: Decimal::from(5_000),
            max_principal: Decimal::from(500_000),
            max_age_days: 365,
            verify_ratio: 0.7,
        }
    }
}

/// A serializable loan description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioLoan {
    pub customer: AccountId,
    pub name: String,
    pub principal: Decimal,
    pub annual_rate: Decimal,
    pub loan_type: LoanType,
    pub frequency: PaymentFrequency,
    pub created_days_ago: i64,
}

/// A serializable payment against a loan, by index into the loan list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPayment {
    pub loan_index: usize,
    pub amount: Decimal,
    pub verified: bool,
}

/// A serializable cashback instruction, by index into the loan list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioCashbackConfig {
    pub loan_index: usize,
    pub beneficiary: AccountId,
    pub rate: CashbackRate,
}

/// A full scenario: loans, their payments, and cashback instructions.
/// Replayable into a [`LendingEngine`] via [`Portfolio::build`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub system_account: AccountId,
    pub loans: Vec<PortfolioLoan>,
    pub payments: Vec<PortfolioPayment>,
    #[serde(default)]
    pub cashback_configs: Vec<PortfolioCashbackConfig>,
}

impl Portfolio {
    /// Replay this portfolio into a fresh engine: create the loans, attach
    /// the cashback configs, then submit and verify the payments in order.
    ///
    /// Portfolio files are user-authored, so a `loan_index` pointing past
    /// the loan list is reported as an error, not a panic.
    pub fn build(&self) -> Result<LendingEngine, PortfolioError> {
        let mut engine = LendingEngine::new(self.system_account.clone());
        let actor = self.system_account.clone();
        let now = Utc::now();

        let mut loan_ids = Vec::with_capacity(self.loans.len());
        for entry in &self.loans {
            let loan = Loan::new(
                entry.customer.clone(),
                entry.name.clone(),
                entry.principal,
                entry.annual_rate,
                entry.frequency,
                entry.loan_type,
            )
            .with_created_at(now - Duration::days(entry.created_days_ago));
            loan_ids.push(engine.add_loan(loan)?);
        }

        for config in &self.cashback_configs {
            let loan_id = Self::loan_at(&loan_ids, config.loan_index)?;
            engine.add_loan_cashback_config(loan_id, config.beneficiary.clone(), config.rate)?;
        }

        for payment in &self.payments {
            let loan_id = Self::loan_at(&loan_ids, payment.loan_index)?;
            let id =
                engine.submit_payment(loan_id, payment.amount, now, PaymentDetails::default())?;
            if payment.verified {
                engine.verify_payment(id, actor.clone())?;
            }
        }

        Ok(engine)
    }

    fn loan_at(loan_ids: &[LoanId], index: usize) -> Result<LoanId, PortfolioError> {
        loan_ids
            .get(index)
            .copied()
            .ok_or(PortfolioError::LoanIndexOutOfRange {
                index,
                loan_count: loan_ids.len(),
            })
    }
}

/// Generate a random portfolio. Payment amounts are capped below each
/// loan's accrued interest so interest-only submissions always validate.
pub fn generate_random_portfolio(config: &PortfolioConfig) -> Portfolio {
    let mut rng = rand::thread_rng();

    let customers: Vec<AccountId> = (0..config.customer_count)
        .map(|i| AccountId::new(format!("CUST-{:03}", i)))
        .collect();

    let min_f64: f64 = config.min_principal.to_string().parse().unwrap_or(5_000.0);
    let max_f64: f64 = config
        .max_principal
        .to_string()
        .parse()
        .unwrap_or(500_000.0);

    let mut loans = Vec::with_capacity(config.loan_count);
    for i in 0..config.loan_count {
        let principal_f64 = rng.gen_range(min_f64..max_f64);
        let principal = Decimal::from_f64_retain(principal_f64)
            .unwrap_or(Decimal::from(5_000))
            .round_dp(2);
        let rate = Decimal::from_f64_retain(rng.gen_range(0.08..0.30))
            .unwrap_or(dec!(0.18))
            .round_dp(4);
        loans.push(PortfolioLoan {
            customer: customers[rng.gen_range(0..customers.len())].clone(),
            name: format!("LOAN-{:04}", i),
            principal,
            annual_rate: rate,
            loan_type: if rng.gen_bool(0.4) {
                LoanType::InterestOnly
            } else {
                LoanType::Regular
            },
            frequency: if rng.gen_bool(0.5) {
                PaymentFrequency::Daily
            } else {
                PaymentFrequency::Monthly
            },
            // At least a month old so interest has accrued.
            created_days_ago: rng.gen_range(30..=config.max_age_days),
        });
    }

    let mut payments = Vec::with_capacity(config.loan_count * config.avg_payments_per_loan);
    for (loan_index, entry) in loans.iter().enumerate() {
        let accrued = interest_for_days(entry.principal, entry.annual_rate, entry.created_days_ago);
        let count = rng.gen_range(0..=config.avg_payments_per_loan * 2);
        if count == 0 {
            continue;
        }
        // Keep the sum of payments per loan under its accrued interest so
        // interest-only submissions always validate on replay.
        let cap = (accrued / Decimal::from(count + 1)).round_dp(2);
        if cap < dec!(0.02) {
            continue;
        }
        let cap_f64: f64 = cap.to_string().parse().unwrap_or(1.0);
        for _ in 0..count {
            let amount = Decimal::from_f64_retain(rng.gen_range(0.01..cap_f64))
                .unwrap_or(dec!(0.01))
                .round_dp(2);
            if amount <= Decimal::ZERO {
                continue;
            }
            payments.push(PortfolioPayment {
                loan_index,
                amount,
                verified: rng.gen_bool(config.verify_ratio),
            });
        }
    }

    let cashback_configs = (0..loans.len() / 5)
        .map(|i| PortfolioCashbackConfig {
            loan_index: i * 5,
            beneficiary: customers[i % customers.len()].clone(),
            rate: CashbackRate::Percentage(dec!(0.05)),
        })
        .collect();

    Portfolio {
        system_account: AccountId::new("SYSTEM"),
        loans,
        payments,
        cashback_configs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_portfolio_generation() {
        let config = PortfolioConfig {
            customer_count: 5,
            loan_count: 10,
            avg_payments_per_loan: 3,
            ..Default::default()
        };

        let portfolio = generate_random_portfolio(&config);
        assert_eq!(portfolio.loans.len(), 10);
        assert!(portfolio.payments.len() <= 10 * 3 * 2);
    }

    #[test]
    fn test_random_portfolio_replays_cleanly() {
        let portfolio = generate_random_portfolio(&PortfolioConfig::default());
        let engine = portfolio.build().unwrap();

        assert_eq!(engine.book().loans().count(), portfolio.loans.len());
        // Every remaining balance stays non-negative after replay.
        for loan in engine.book().loans() {
            assert!(loan.remaining_principal() >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_out_of_range_loan_index_is_an_error() {
        let loan = PortfolioLoan {
            customer: AccountId::new("CUST-001"),
            name: "LOAN-0001".into(),
            principal: dec!(50000),
            annual_rate: dec!(0.21),
            loan_type: LoanType::InterestOnly,
            frequency: PaymentFrequency::Daily,
            created_days_ago: 30,
        };

        // A payment pointing past the loan list.
        let portfolio = Portfolio {
            system_account: AccountId::new("SYSTEM"),
            loans: vec![loan.clone()],
            payments: vec![PortfolioPayment {
                loan_index: 5,
                amount: dec!(100),
                verified: true,
            }],
            cashback_configs: Vec::new(),
        };
        let err = portfolio.build().unwrap_err();
        assert_eq!(
            err,
            PortfolioError::LoanIndexOutOfRange {
                index: 5,
                loan_count: 1
            }
        );

        // Same for a cashback config.
        let portfolio = Portfolio {
            system_account: AccountId::new("SYSTEM"),
            loans: vec![loan],
            payments: Vec::new(),
            cashback_configs: vec![PortfolioCashbackConfig {
                loan_index: 2,
                beneficiary: AccountId::new("CUST-001"),
                rate: CashbackRate::Percentage(dec!(0.05)),
            }],
        };
        let err = portfolio.build().unwrap_err();
        assert_eq!(
            err,
            PortfolioError::LoanIndexOutOfRange {
                index: 2,
                loan_count: 1
            }
        );
    }

    #[test]
    fn test_portfolio_round_trips_through_json() {
        let portfolio = generate_random_portfolio(&PortfolioConfig {
            loan_count: 3,
            ..Default::default()
        });
        let json = serde_json::to_string(&portfolio).unwrap();
        let parsed: Portfolio = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.loans.len(), portfolio.loans.len());
        assert_eq!(parsed.payments.len(), portfolio.payments.len());
    }
}
