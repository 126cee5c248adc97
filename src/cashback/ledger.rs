use crate::core::account::AccountId;
use crate::core::loan::LoanId;
use crate::core::payment::PaymentId;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::{ConfigId, LoanCashbackConfig, TrackerCashbackConfig};
use super::transaction::{CashbackTransaction, TransactionId, TransactionType};

/// Errors arising from cashback ledger operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CashbackError {
    #[error("account {account} has {balance} points, requested {requested}")]
    InsufficientBalance {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
    },
    #[error("account {0} cannot transfer points to itself")]
    SelfTransfer(AccountId),
    #[error("points amount must be positive, got {points}")]
    NonPositivePoints { points: Decimal },
    #[error("cashback config {0} not found")]
    ConfigNotFound(ConfigId),
}

/// Append-only ledger of cashback point movements.
///
/// There is no stored balance anywhere: an account's balance is the sum of
/// points received minus points sent, recomputed from the rows on demand.
/// Rows are never updated or deleted; reversals are new rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashbackLedger {
    /// Sink for deductions and redemption debits.
    system_account: AccountId,
    transactions: Vec<CashbackTransaction>,
}

impl CashbackLedger {
    pub fn new(system_account: AccountId) -> Self {
        Self {
            system_account,
            transactions: Vec::new(),
        }
    }

    pub fn system_account(&self) -> &AccountId {
        &self.system_account
    }

    pub fn transactions(&self) -> &[CashbackTransaction] {
        &self.transactions
    }

    pub fn transactions_for<'a>(
        &'a self,
        account: &'a AccountId,
    ) -> impl Iterator<Item = &'a CashbackTransaction> + 'a {
        self.transactions
            .iter()
            .filter(move |tx| tx.to() == account || tx.from() == Some(account))
    }

    /// Derived balance: points received minus points sent.
    ///
    /// Deduction and redemption rows flow into the system account as a
    /// bookkeeping sink; they are excluded from its received sum so
    /// administrative absorption never reads as spendable balance.
    pub fn balance(&self, account: &AccountId) -> Decimal {
        let received: Decimal = self
            .transactions
            .iter()
            .filter(|tx| tx.to() == account)
            .filter(|tx| {
                account != &self.system_account
                    || !matches!(
                        tx.transaction_type(),
                        TransactionType::Deduction | TransactionType::Redemption
                    )
            })
            .map(|tx| tx.points())
            .sum();
        let sent: Decimal = self
            .transactions
            .iter()
            .filter(|tx| tx.from() == Some(account))
            .map(|tx| tx.points())
            .sum();
        received - sent
    }

    // --- Movements ---

    /// Transfer points between two user accounts. Refused for
    /// self-transfers and for amounts above the sender's balance.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        points: Decimal,
        note: Option<String>,
    ) -> Result<TransactionId, CashbackError> {
        validate_points(points)?;
        if from == to {
            return Err(CashbackError::SelfTransfer(from));
        }
        self.check_balance(&from, points)?;

        let mut tx = CashbackTransaction::new(Some(from), to, points, TransactionType::Transfer);
        if let Some(n) = note {
            tx = tx.with_note(n);
        }
        Ok(self.push(tx))
    }

    /// Mint points to an account with no linkage (admin grant).
    pub fn grant(
        &mut self,
        to: AccountId,
        points: Decimal,
        note: Option<String>,
        actor: AccountId,
    ) -> Result<TransactionId, CashbackError> {
        validate_points(points)?;
        let mut tx = CashbackTransaction::new(None, to, points, TransactionType::Unconditional)
            .with_created_by(actor);
        if let Some(n) = note {
            tx = tx.with_note(n);
        }
        Ok(self.push(tx))
    }

    /// Mint points tied to a loan (manual admin grant).
    pub fn grant_for_loan(
        &mut self,
        to: AccountId,
        points: Decimal,
        loan_id: LoanId,
        note: Option<String>,
        actor: AccountId,
    ) -> Result<TransactionId, CashbackError> {
        validate_points(points)?;
        let mut tx =
            CashbackTransaction::new(None, to, points, TransactionType::LoanInterestManual)
                .with_loan(loan_id)
                .with_created_by(actor);
        if let Some(n) = note {
            tx = tx.with_note(n);
        }
        Ok(self.push(tx))
    }

    /// Remove points from a user balance into the system account.
    pub fn deduct(
        &mut self,
        from: AccountId,
        points: Decimal,
        note: Option<String>,
        actor: AccountId,
    ) -> Result<TransactionId, CashbackError> {
        validate_points(points)?;
        self.check_balance(&from, points)?;

        let mut tx = CashbackTransaction::new(
            Some(from),
            self.system_account.clone(),
            points,
            TransactionType::Deduction,
        )
        .with_created_by(actor);
        if let Some(n) = note {
            tx = tx.with_note(n);
        }
        Ok(self.push(tx))
    }

    /// Fire every active config for a newly verified payment, minting points
    /// off its final interest amount. Configs computing zero or negative
    /// points are skipped.
    pub fn auto_grant_for_payment(
        &mut self,
        configs: &[LoanCashbackConfig],
        loan_id: LoanId,
        payment_id: PaymentId,
        interest: Decimal,
        actor: AccountId,
    ) -> Vec<TransactionId> {
        let mut granted = Vec::new();
        for config in configs {
            if !config.is_active() || config.loan_id() != loan_id {
                continue;
            }
            let points = config.rate().points_for(interest);
            if points <= Decimal::ZERO {
                debug!("config {} computed no points, skipping", config.id());
                continue;
            }
            let tx = CashbackTransaction::new(
                None,
                config.beneficiary().clone(),
                points,
                TransactionType::LoanInterestAuto,
            )
            .with_loan(loan_id)
            .with_payment(payment_id)
            .with_created_by(actor.clone());
            info!(
                "auto cashback: {} points to {} for payment {}",
                points,
                config.beneficiary(),
                payment_id
            );
            granted.push(self.push(tx));
        }
        granted
    }

    /// Fire every active tracker config for one accepted tracker day,
    /// minting points off that day's base amount. Mirrors
    /// [`Self::auto_grant_for_payment`].
    pub fn auto_grant_for_tracker(
        &mut self,
        configs: &[TrackerCashbackConfig],
        tracker_ref: &str,
        day: u32,
        base_amount: Decimal,
        actor: AccountId,
    ) -> Vec<TransactionId> {
        let mut granted = Vec::new();
        for config in configs {
            if !config.is_active() || config.tracker_ref() != tracker_ref {
                continue;
            }
            let points = config.rate().points_for(base_amount);
            if points <= Decimal::ZERO {
                debug!("tracker config {} computed no points, skipping", config.id());
                continue;
            }
            let tx = CashbackTransaction::new(
                None,
                config.beneficiary().clone(),
                points,
                TransactionType::TrackerEntry,
            )
            .with_tracker(tracker_ref, day)
            .with_created_by(actor.clone());
            granted.push(self.push(tx));
        }
        granted
    }

    /// Mint points for one day of an external activity tracker.
    pub fn record_tracker_entry(
        &mut self,
        to: AccountId,
        points: Decimal,
        tracker_ref: impl Into<String>,
        day: u32,
        note: Option<String>,
        actor: AccountId,
    ) -> Result<TransactionId, CashbackError> {
        validate_points(points)?;
        let mut tx = CashbackTransaction::new(None, to, points, TransactionType::TrackerEntry)
            .with_tracker(tracker_ref, day)
            .with_created_by(actor);
        if let Some(n) = note {
            tx = tx.with_note(n);
        }
        Ok(self.push(tx))
    }

    /// Debit points for a redemption request, into the system account.
    pub(crate) fn debit_for_redemption(
        &mut self,
        user: AccountId,
        points: Decimal,
        note: Option<String>,
    ) -> Result<TransactionId, CashbackError> {
        validate_points(points)?;
        self.check_balance(&user, points)?;

        let mut tx = CashbackTransaction::new(
            Some(user),
            self.system_account.clone(),
            points,
            TransactionType::Redemption,
        );
        if let Some(n) = note {
            tx = tx.with_note(n);
        }
        Ok(self.push(tx))
    }

    /// Restore points from a cancelled redemption. Minted, not transferred:
    /// the original debit row stays in the ledger untouched.
    pub(crate) fn refund_redemption(
        &mut self,
        user: AccountId,
        points: Decimal,
        note: Option<String>,
    ) -> Result<TransactionId, CashbackError> {
        validate_points(points)?;
        let mut tx =
            CashbackTransaction::new(None, user, points, TransactionType::RedemptionRefund);
        if let Some(n) = note {
            tx = tx.with_note(n);
        }
        Ok(self.push(tx))
    }

    // --- Reporting ---

    pub fn total_by_type(&self, transaction_type: TransactionType) -> Decimal {
        self.transactions
            .iter()
            .filter(|tx| tx.transaction_type() == transaction_type)
            .map(|tx| tx.points())
            .sum()
    }

    /// All points ever granted against a loan, automatic and manual.
    pub fn loan_cashback_total(&self, loan_id: LoanId) -> Decimal {
        self.transactions
            .iter()
            .filter(|tx| tx.related_loan_id() == Some(loan_id))
            .filter(|tx| {
                matches!(
                    tx.transaction_type(),
                    TransactionType::LoanInterestAuto | TransactionType::LoanInterestManual
                )
            })
            .map(|tx| tx.points())
            .sum()
    }

    pub fn payment_cashback_total(&self, payment_id: PaymentId) -> Decimal {
        self.transactions
            .iter()
            .filter(|tx| tx.related_payment_id() == Some(payment_id))
            .map(|tx| tx.points())
            .sum()
    }

    pub fn tracker_cashback_total(&self, tracker_ref: &str) -> Decimal {
        self.transactions
            .iter()
            .filter(|tx| tx.related_tracker() == Some(tracker_ref))
            .map(|tx| tx.points())
            .sum()
    }

    fn check_balance(&self, account: &AccountId, requested: Decimal) -> Result<(), CashbackError> {
        let balance = self.balance(account);
        if requested > balance {
            return Err(CashbackError::InsufficientBalance {
                account: account.clone(),
                balance,
                requested,
            });
        }
        Ok(())
    }

    fn push(&mut self, tx: CashbackTransaction) -> TransactionId {
        let id = tx.id();
        self.transactions.push(tx);
        id
    }
}

fn validate_points(points: Decimal) -> Result<(), CashbackError> {
    if points <= Decimal::ZERO {
        return Err(CashbackError::NonPositivePoints { points });
    }
    Ok(())
}
