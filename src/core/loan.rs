use crate::core::account::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How often interest is expected to be serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Daily,
    Monthly,
}

/// Whether payments can reduce principal.
///
/// Interest-only loans accept interest payments exclusively; their
/// remaining principal never moves after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    Regular,
    InterestOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Closed,
}

/// An interest-bearing loan.
///
/// Interest always accrues on the *original* principal from inception;
/// `remaining_principal` tracks what verified principal payments have
/// left outstanding. The balance is mutated only by payment verification,
/// loan splitting, or an explicit admin principal edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    id: LoanId,
    customer: AccountId,
    name: String,
    principal_amount: Decimal,
    remaining_principal: Decimal,
    /// Annual rate as a fraction: 0.21 = 21%.
    annual_rate: Decimal,
    payment_frequency: PaymentFrequency,
    loan_type: LoanType,
    status: LoanStatus,
    created_at: DateTime<Utc>,
}

impl Loan {
    /// Create a new active loan. Callers validate principal and rate first.
    ///
    /// # Panics
    ///
    /// Panics if `principal` is not positive.
    pub fn new(
        customer: AccountId,
        name: impl Into<String>,
        principal: Decimal,
        annual_rate: Decimal,
        payment_frequency: PaymentFrequency,
        loan_type: LoanType,
    ) -> Self {
        assert!(
            principal > Decimal::ZERO,
            "loan principal must be positive, got {}",
            principal
        );
        Self {
            id: LoanId::new(),
            customer,
            name: name.into(),
            principal_amount: principal,
            remaining_principal: principal,
            annual_rate,
            payment_frequency,
            loan_type,
            status: LoanStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// Backdate the loan's creation timestamp (admin-entered historical loans).
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> LoanId {
        self.id
    }

    pub fn customer(&self) -> &AccountId {
        &self.customer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn principal_amount(&self) -> Decimal {
        self.principal_amount
    }

    pub fn remaining_principal(&self) -> Decimal {
        self.remaining_principal
    }

    pub fn annual_rate(&self) -> Decimal {
        self.annual_rate
    }

    pub fn payment_frequency(&self) -> PaymentFrequency {
        self.payment_frequency
    }

    pub fn loan_type(&self) -> LoanType {
        self.loan_type
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whole days elapsed since loan creation, floored. Negative before creation.
    pub fn days_elapsed(&self, as_of: DateTime<Utc>) -> i64 {
        (as_of - self.created_at).num_days()
    }

    // --- Crate-private mutation, reachable only through the loan book ---

    pub(crate) fn debit_principal(&mut self, amount: Decimal) {
        self.remaining_principal = (self.remaining_principal - amount).max(Decimal::ZERO);
    }

    pub(crate) fn credit_principal(&mut self, amount: Decimal) {
        self.remaining_principal += amount;
    }

    pub(crate) fn set_principal_amount(&mut self, principal: Decimal) {
        self.principal_amount = principal;
    }

    pub(crate) fn set_annual_rate(&mut self, rate: Decimal) {
        self.annual_rate = rate;
    }

    pub(crate) fn close(&mut self) {
        self.status = LoanStatus::Closed;
    }
}

/// Unique identifier for a loan split record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitId(Uuid);

impl SplitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SplitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SplitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Audit record of one loan split operation. Immutable once created;
/// a loan may accumulate many of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSplit {
    id: SplitId,
    original_loan_id: LoanId,
    split_loan_id: LoanId,
    split_principal_amount: Decimal,
    created_by: AccountId,
    created_at: DateTime<Utc>,
}

impl LoanSplit {
    pub(crate) fn new(
        original_loan_id: LoanId,
        split_loan_id: LoanId,
        split_principal_amount: Decimal,
        created_by: AccountId,
    ) -> Self {
        Self {
            id: SplitId::new(),
            original_loan_id,
            split_loan_id,
            split_principal_amount,
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SplitId {
        self.id
    }

    pub fn original_loan_id(&self) -> LoanId {
        self.original_loan_id
    }

    pub fn split_loan_id(&self) -> LoanId {
        self.split_loan_id
    }

    pub fn split_principal_amount(&self) -> Decimal {
        self.split_principal_amount
    }

    pub fn created_by(&self) -> &AccountId {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn sample_loan() -> Loan {
        Loan::new(
            AccountId::new("alice"),
            "Working capital",
            dec!(50000),
            dec!(0.21),
            PaymentFrequency::Daily,
            LoanType::Regular,
        )
    }

    #[test]
    fn test_loan_creation() {
        let loan = sample_loan();
        assert_eq!(loan.principal_amount(), dec!(50000));
        assert_eq!(loan.remaining_principal(), dec!(50000));
        assert_eq!(loan.status(), LoanStatus::Active);
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_loan_zero_principal() {
        Loan::new(
            AccountId::new("alice"),
            "bad",
            Decimal::ZERO,
            dec!(0.21),
            PaymentFrequency::Daily,
            LoanType::Regular,
        );
    }

    #[test]
    fn test_days_elapsed_floors() {
        let loan = sample_loan().with_created_at(Utc::now() - Duration::hours(47));
        assert_eq!(loan.days_elapsed(Utc::now()), 1);
    }

    #[test]
    fn test_debit_clamps_at_zero() {
        let mut loan = sample_loan();
        loan.debit_principal(dec!(60000));
        assert_eq!(loan.remaining_principal(), Decimal::ZERO);
    }
}
