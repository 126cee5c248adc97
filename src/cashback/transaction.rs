use crate::core::account::AccountId;
use crate::core::loan::LoanId;
use crate::core::payment::PaymentId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a cashback transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why points moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Peer-to-peer transfer between accounts.
    Transfer,
    /// Automatic grant fired by payment verification.
    LoanInterestAuto,
    /// Manual admin grant tied to a loan.
    LoanInterestManual,
    /// Grant tied to an external activity tracker.
    TrackerEntry,
    /// Manual admin grant with no linkage.
    Unconditional,
    /// Admin-initiated deduction from a user balance.
    Deduction,
    /// Points debited when a redemption is requested.
    Redemption,
    /// Points restored when a redemption is cancelled.
    RedemptionRefund,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionType::Transfer => "transfer",
            TransactionType::LoanInterestAuto => "loan_interest_auto",
            TransactionType::LoanInterestManual => "loan_interest_manual",
            TransactionType::TrackerEntry => "tracker_entry",
            TransactionType::Unconditional => "unconditional",
            TransactionType::Deduction => "deduction",
            TransactionType::Redemption => "redemption",
            TransactionType::RedemptionRefund => "redemption_refund",
        };
        write!(f, "{}", s)
    }
}

/// One immutable row in the cashback ledger.
///
/// `from == None` means the points were minted (grants, refunds) rather
/// than moved from another account. Balances are never stored; they are
/// derived by summing these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashbackTransaction {
    id: TransactionId,
    from: Option<AccountId>,
    to: AccountId,
    points: Decimal,
    transaction_type: TransactionType,
    related_loan_id: Option<LoanId>,
    related_payment_id: Option<PaymentId>,
    related_tracker: Option<String>,
    related_tracker_day: Option<u32>,
    note: Option<String>,
    created_by: Option<AccountId>,
    created_at: DateTime<Utc>,
}

impl CashbackTransaction {
    /// Build a row. Callers validate that `points` is positive first.
    pub(crate) fn new(
        from: Option<AccountId>,
        to: AccountId,
        points: Decimal,
        transaction_type: TransactionType,
    ) -> Self {
        debug_assert!(points > Decimal::ZERO);
        Self {
            id: TransactionId::new(),
            from,
            to,
            points,
            transaction_type,
            related_loan_id: None,
            related_payment_id: None,
            related_tracker: None,
            related_tracker_day: None,
            note: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn with_loan(mut self, loan_id: LoanId) -> Self {
        self.related_loan_id = Some(loan_id);
        self
    }

    pub(crate) fn with_payment(mut self, payment_id: PaymentId) -> Self {
        self.related_payment_id = Some(payment_id);
        self
    }

    pub(crate) fn with_tracker(mut self, tracker: impl Into<String>, day: u32) -> Self {
        self.related_tracker = Some(tracker.into());
        self.related_tracker_day = Some(day);
        self
    }

    pub(crate) fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub(crate) fn with_created_by(mut self, actor: AccountId) -> Self {
        self.created_by = Some(actor);
        self
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn from(&self) -> Option<&AccountId> {
        self.from.as_ref()
    }

    pub fn to(&self) -> &AccountId {
        &self.to
    }

    pub fn points(&self) -> Decimal {
        self.points
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn related_loan_id(&self) -> Option<LoanId> {
        self.related_loan_id
    }

    pub fn related_payment_id(&self) -> Option<PaymentId> {
        self.related_payment_id
    }

    pub fn related_tracker(&self) -> Option<&str> {
        self.related_tracker.as_deref()
    }

    pub fn related_tracker_day(&self) -> Option<u32> {
        self.related_tracker_day
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn created_by(&self) -> Option<&AccountId> {
        self.created_by.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minted_transaction_has_no_source() {
        let tx = CashbackTransaction::new(
            None,
            AccountId::new("alice"),
            dec!(10),
            TransactionType::Unconditional,
        );
        assert!(tx.from().is_none());
        assert_eq!(tx.to().as_str(), "alice");
        assert_eq!(tx.points(), dec!(10));
    }

    #[test]
    fn test_linkage_builders() {
        let loan = LoanId::new();
        let payment = PaymentId::new();
        let tx = CashbackTransaction::new(
            None,
            AccountId::new("alice"),
            dec!(10),
            TransactionType::LoanInterestAuto,
        )
        .with_loan(loan)
        .with_payment(payment)
        .with_note("auto grant");
        assert_eq!(tx.related_loan_id(), Some(loan));
        assert_eq!(tx.related_payment_id(), Some(payment));
        assert_eq!(tx.note(), Some("auto grant"));
    }

    #[test]
    fn test_serde_snake_case_type_tags() {
        let json = serde_json::to_string(&TransactionType::LoanInterestAuto).unwrap();
        assert_eq!(json, "\"loan_interest_auto\"");
        let json = serde_json::to_string(&TransactionType::RedemptionRefund).unwrap();
        assert_eq!(json, "\"redemption_refund\"");
    }
}
