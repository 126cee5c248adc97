use crate::core::account::AccountId;
use chrono::{DateTime, Utc};
use log::info;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::ledger::{CashbackError, CashbackLedger};
use super::transaction::TransactionId;

/// Amazon gift cards exist only in multiples of this denomination.
const GIFT_CARD_DENOMINATION: Decimal = dec!(500);

/// Errors arising from the redemption workflow.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RedemptionError {
    #[error(transparent)]
    Cashback(#[from] CashbackError),
    #[error("redemption amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },
    #[error("gift card amount {amount} is not a multiple of {GIFT_CARD_DENOMINATION}")]
    InvalidDenomination { amount: Decimal },
    #[error("redemption {0} not found")]
    NotFound(RedemptionId),
    #[error("redemption {0} has already been processed")]
    AlreadyProcessed(RedemptionId),
    #[error("redemption {0} has no linked ledger transaction")]
    MissingOriginalTransaction(RedemptionId),
}

/// Unique identifier for a redemption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedemptionId(Uuid);

impl RedemptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RedemptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RedemptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the user wants their points paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionType {
    BankTransfer,
    Upi,
    AmazonGiftCard,
}

/// Payout coordinates captured at request time. Which fields matter
/// depends on the redemption type; all are optional here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayoutDetails {
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub bank_name: Option<String>,
    pub upi_id: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Pending,
    Completed,
    Cancelled,
}

/// One redemption request and its lifecycle.
///
/// Points are debited at request time, not at completion, so a pending
/// redemption already holds the user's points. Cancellation refunds via a
/// fresh ledger row rather than deleting the debit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashbackRedemption {
    id: RedemptionId,
    user: AccountId,
    amount: Decimal,
    redemption_type: RedemptionType,
    payout: PayoutDetails,
    status: RedemptionStatus,
    /// The ledger row that debited the points at request time.
    redemption_transaction_id: Option<TransactionId>,
    processed_by: Option<AccountId>,
    processed_at: Option<DateTime<Utc>>,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl CashbackRedemption {
    pub fn id(&self) -> RedemptionId {
        self.id
    }

    pub fn user(&self) -> &AccountId {
        &self.user
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn redemption_type(&self) -> RedemptionType {
        self.redemption_type
    }

    pub fn payout(&self) -> &PayoutDetails {
        &self.payout
    }

    pub fn status(&self) -> RedemptionStatus {
        self.status
    }

    pub fn redemption_transaction_id(&self) -> Option<TransactionId> {
        self.redemption_transaction_id
    }

    pub fn processed_by(&self) -> Option<&AccountId> {
        self.processed_by.as_ref()
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn admin_notes(&self) -> Option<&str> {
        self.admin_notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Holds redemption requests and drives their lifecycle against the
/// cashback ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedemptionRegistry {
    redemptions: Vec<CashbackRedemption>,
}

impl RedemptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[CashbackRedemption] {
        &self.redemptions
    }

    pub fn get(&self, id: RedemptionId) -> Result<&CashbackRedemption, RedemptionError> {
        self.redemptions
            .iter()
            .find(|r| r.id() == id)
            .ok_or(RedemptionError::NotFound(id))
    }

    pub fn pending(&self) -> impl Iterator<Item = &CashbackRedemption> {
        self.redemptions
            .iter()
            .filter(|r| r.status() == RedemptionStatus::Pending)
    }

    /// Request a redemption. Validates the amount (and denomination for
    /// gift cards), debits the points immediately, then records the
    /// request. A failed balance check leaves both structures untouched.
    pub fn request(
        &mut self,
        ledger: &mut CashbackLedger,
        user: AccountId,
        amount: Decimal,
        redemption_type: RedemptionType,
        payout: PayoutDetails,
    ) -> Result<RedemptionId, RedemptionError> {
        if amount <= Decimal::ZERO {
            return Err(RedemptionError::NonPositiveAmount { amount });
        }
        if redemption_type == RedemptionType::AmazonGiftCard
            && amount % GIFT_CARD_DENOMINATION != Decimal::ZERO
        {
            return Err(RedemptionError::InvalidDenomination { amount });
        }

        let id = RedemptionId::new();
        let tx_id = ledger.debit_for_redemption(
            user.clone(),
            amount,
            Some(format!("redemption request {}", id)),
        )?;

        self.redemptions.push(CashbackRedemption {
            id,
            user,
            amount,
            redemption_type,
            payout,
            status: RedemptionStatus::Pending,
            redemption_transaction_id: Some(tx_id),
            processed_by: None,
            processed_at: None,
            admin_notes: None,
            created_at: Utc::now(),
        });
        info!("redemption {} requested for {} points", id, amount);
        Ok(id)
    }

    /// Mark a pending redemption as paid out. The points were already
    /// debited at request time, so no ledger row is written here.
    pub fn complete(
        &mut self,
        id: RedemptionId,
        admin: AccountId,
        notes: Option<String>,
    ) -> Result<(), RedemptionError> {
        let redemption = self.get_mut(id)?;
        if redemption.status != RedemptionStatus::Pending {
            return Err(RedemptionError::AlreadyProcessed(id));
        }
        if redemption.redemption_transaction_id.is_none() {
            return Err(RedemptionError::MissingOriginalTransaction(id));
        }
        redemption.status = RedemptionStatus::Completed;
        redemption.processed_by = Some(admin);
        redemption.processed_at = Some(Utc::now());
        redemption.admin_notes = notes;
        info!("redemption {} completed", id);
        Ok(())
    }

    /// Cancel a pending redemption, refunding the points with a fresh
    /// ledger row.
    pub fn cancel(
        &mut self,
        ledger: &mut CashbackLedger,
        id: RedemptionId,
        admin: AccountId,
        notes: Option<String>,
    ) -> Result<(), RedemptionError> {
        let redemption = self.get_mut(id)?;
        if redemption.status != RedemptionStatus::Pending {
            return Err(RedemptionError::AlreadyProcessed(id));
        }
        if redemption.redemption_transaction_id.is_none() {
            return Err(RedemptionError::MissingOriginalTransaction(id));
        }

        ledger.refund_redemption(
            redemption.user.clone(),
            redemption.amount,
            Some(format!("redemption {} cancelled", id)),
        )?;
        redemption.status = RedemptionStatus::Cancelled;
        redemption.processed_by = Some(admin);
        redemption.processed_at = Some(Utc::now());
        redemption.admin_notes = notes;
        info!("redemption {} cancelled, {} points refunded", id, redemption.amount);
        Ok(())
    }

    fn get_mut(&mut self, id: RedemptionId) -> Result<&mut CashbackRedemption, RedemptionError> {
        self.redemptions
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(RedemptionError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (CashbackLedger, RedemptionRegistry, AccountId) {
        let mut ledger = CashbackLedger::new(AccountId::new("HOUSE"));
        let alice = AccountId::new("alice");
        ledger
            .grant(alice.clone(), dec!(2000), None, AccountId::new("admin"))
            .unwrap();
        (ledger, RedemptionRegistry::new(), alice)
    }

    #[test]
    fn test_request_debits_immediately() {
        let (mut ledger, mut registry, alice) = setup();
        let id = registry
            .request(
                &mut ledger,
                alice.clone(),
                dec!(500),
                RedemptionType::Upi,
                PayoutDetails::default(),
            )
            .unwrap();
        assert_eq!(ledger.balance(&alice), dec!(1500));
        let r = registry.get(id).unwrap();
        assert_eq!(r.status(), RedemptionStatus::Pending);
        assert!(r.redemption_transaction_id().is_some());
    }

    #[test]
    fn test_request_refused_without_balance() {
        let (mut ledger, mut registry, alice) = setup();
        let err = registry
            .request(
                &mut ledger,
                alice.clone(),
                dec!(5000),
                RedemptionType::BankTransfer,
                PayoutDetails::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RedemptionError::Cashback(CashbackError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.balance(&alice), dec!(2000));
        assert!(registry.all().is_empty());
    }

    #[test]
    fn test_gift_card_denomination() {
        let (mut ledger, mut registry, alice) = setup();
        let err = registry
            .request(
                &mut ledger,
                alice.clone(),
                dec!(750),
                RedemptionType::AmazonGiftCard,
                PayoutDetails::default(),
            )
            .unwrap_err();
        assert_eq!(err, RedemptionError::InvalidDenomination { amount: dec!(750) });

        registry
            .request(
                &mut ledger,
                alice,
                dec!(1000),
                RedemptionType::AmazonGiftCard,
                PayoutDetails::default(),
            )
            .unwrap();
    }

    #[test]
    fn test_cancel_refunds_with_new_row() {
        let (mut ledger, mut registry, alice) = setup();
        let id = registry
            .request(
                &mut ledger,
                alice.clone(),
                dec!(500),
                RedemptionType::Upi,
                PayoutDetails::default(),
            )
            .unwrap();
        let rows_before = ledger.transactions().len();

        registry
            .cancel(&mut ledger, id, AccountId::new("admin"), Some("typo".into()))
            .unwrap();
        assert_eq!(ledger.balance(&alice), dec!(2000));
        // Refund is a new row; the debit remains.
        assert_eq!(ledger.transactions().len(), rows_before + 1);
        assert_eq!(registry.get(id).unwrap().status(), RedemptionStatus::Cancelled);
    }

    #[test]
    fn test_processed_redemption_is_terminal() {
        let (mut ledger, mut registry, alice) = setup();
        let admin = AccountId::new("admin");
        let id = registry
            .request(
                &mut ledger,
                alice.clone(),
                dec!(500),
                RedemptionType::Upi,
                PayoutDetails::default(),
            )
            .unwrap();

        registry.complete(id, admin.clone(), None).unwrap();
        assert_eq!(
            registry.cancel(&mut ledger, id, admin.clone(), None),
            Err(RedemptionError::AlreadyProcessed(id))
        );
        assert_eq!(
            registry.complete(id, admin, None),
            Err(RedemptionError::AlreadyProcessed(id))
        );
        // Completion never touches the balance again.
        assert_eq!(ledger.balance(&alice), dec!(1500));
    }
}
