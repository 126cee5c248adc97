use crate::core::loan::LoanId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

impl PaymentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Approval state of a payment.
///
/// A payment is born pending; only verification makes it authoritative.
/// A rejected payment is defined as never having happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Verified,
    Rejected,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// A customer payment against a loan.
///
/// The interest/principal split is a snapshot computed at submission time
/// and is never recomputed afterwards except through an explicit admin
/// correction. Invariant: `amount == interest_amount + principal_amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    loan_id: LoanId,
    amount: Decimal,
    interest_amount: Decimal,
    principal_amount: Decimal,
    payment_date: DateTime<Utc>,
    status: PaymentStatus,
    transaction_ref: Option<String>,
    payment_method: Option<String>,
    proof_ref: Option<String>,
    /// Set when an admin reassigns this payment to a split child loan.
    split_loan_id: Option<LoanId>,
    /// Principal portion at the moment of reassignment, kept for audit.
    original_principal_at_assignment: Option<Decimal>,
}

impl Payment {
    pub(crate) fn new(
        loan_id: LoanId,
        amount: Decimal,
        interest_amount: Decimal,
        principal_amount: Decimal,
        payment_date: DateTime<Utc>,
    ) -> Self {
        debug_assert_eq!(amount, interest_amount + principal_amount);
        Self {
            id: PaymentId::new(),
            loan_id,
            amount,
            interest_amount,
            principal_amount,
            payment_date,
            status: PaymentStatus::Pending,
            transaction_ref: None,
            payment_method: None,
            proof_ref: None,
            split_loan_id: None,
            original_principal_at_assignment: None,
        }
    }

    /// Attach an external transaction reference.
    pub fn with_transaction_ref(mut self, reference: impl Into<String>) -> Self {
        self.transaction_ref = Some(reference.into());
        self
    }

    /// Attach a payment method label (UPI, bank transfer, cash, ...).
    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    /// Attach an opaque reference to an uploaded payment proof.
    pub fn with_proof_ref(mut self, proof: impl Into<String>) -> Self {
        self.proof_ref = Some(proof.into());
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn loan_id(&self) -> LoanId {
        self.loan_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn interest_amount(&self) -> Decimal {
        self.interest_amount
    }

    pub fn principal_amount(&self) -> Decimal {
        self.principal_amount
    }

    pub fn payment_date(&self) -> DateTime<Utc> {
        self.payment_date
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn transaction_ref(&self) -> Option<&str> {
        self.transaction_ref.as_deref()
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    pub fn proof_ref(&self) -> Option<&str> {
        self.proof_ref.as_deref()
    }

    pub fn split_loan_id(&self) -> Option<LoanId> {
        self.split_loan_id
    }

    pub fn original_principal_at_assignment(&self) -> Option<Decimal> {
        self.original_principal_at_assignment
    }

    // --- Crate-private mutation, reachable only through the loan book ---

    pub(crate) fn set_status(&mut self, status: PaymentStatus) {
        self.status = status;
    }

    /// Replace the amounts during an admin correction. The caller has
    /// already checked that `amount == interest + principal`.
    pub(crate) fn correct_amounts(
        &mut self,
        amount: Decimal,
        interest_amount: Decimal,
        principal_amount: Decimal,
    ) {
        debug_assert_eq!(amount, interest_amount + principal_amount);
        self.amount = amount;
        self.interest_amount = interest_amount;
        self.principal_amount = principal_amount;
    }

    pub(crate) fn assign_to_split(&mut self, split_loan_id: LoanId) {
        self.original_principal_at_assignment = Some(self.principal_amount);
        self.split_loan_id = Some(split_loan_id);
    }
}
