//! The operational facade tying the loan book, the cashback ledger, and
//! the redemption registry together.

use crate::cashback::config::{CashbackRate, ConfigId, LoanCashbackConfig, TrackerCashbackConfig};
use crate::cashback::ledger::{CashbackError, CashbackLedger};
use crate::cashback::redemption::{
    PayoutDetails, RedemptionError, RedemptionId, RedemptionRegistry, RedemptionType,
};
use crate::cashback::transaction::TransactionId;
use crate::core::account::AccountId;
use crate::core::loan::{Loan, LoanId, LoanType, PaymentFrequency};
use crate::core::money::MoneyError;
use crate::core::payment::PaymentId;
use crate::ledger::accrual::AccruedInterest;
use crate::ledger::book::{LedgerError, LoanBook, PaymentDetails, VerifyOutcome};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Single entry point for every lending operation.
///
/// Owns all state and serializes mutation through `&mut self`. The one
/// cross-module rule lives here: payment verification fires the automatic
/// cashback grants, and only on the pending-to-verified transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingEngine {
    book: LoanBook,
    cashback: CashbackLedger,
    redemptions: RedemptionRegistry,
    loan_configs: Vec<LoanCashbackConfig>,
    tracker_configs: Vec<TrackerCashbackConfig>,
}

impl LendingEngine {
    /// `system_account` absorbs deductions and redemption debits.
    pub fn new(system_account: AccountId) -> Self {
        Self {
            book: LoanBook::new(),
            cashback: CashbackLedger::new(system_account),
            redemptions: RedemptionRegistry::new(),
            loan_configs: Vec::new(),
            tracker_configs: Vec::new(),
        }
    }

    pub fn book(&self) -> &LoanBook {
        &self.book
    }

    pub fn cashback(&self) -> &CashbackLedger {
        &self.cashback
    }

    pub fn redemptions(&self) -> &RedemptionRegistry {
        &self.redemptions
    }

    pub fn loan_configs(&self) -> &[LoanCashbackConfig] {
        &self.loan_configs
    }

    pub fn tracker_configs(&self) -> &[TrackerCashbackConfig] {
        &self.tracker_configs
    }

    // --- Loans ---

    pub fn create_loan(
        &mut self,
        customer: AccountId,
        name: impl Into<String>,
        principal: Decimal,
        annual_rate: Decimal,
        frequency: PaymentFrequency,
        loan_type: LoanType,
    ) -> Result<LoanId, LedgerError> {
        self.book
            .create_loan(customer, name, principal, annual_rate, frequency, loan_type)
    }

    pub fn add_loan(&mut self, loan: Loan) -> Result<LoanId, LedgerError> {
        self.book.add_loan(loan)
    }

    pub fn edit_loan_principal(&mut self, id: LoanId, principal: Decimal) -> Result<(), LedgerError> {
        self.book.edit_loan_principal(id, principal)
    }

    pub fn edit_loan_rate(&mut self, id: LoanId, rate: Decimal) -> Result<(), LedgerError> {
        self.book.edit_loan_rate(id, rate)
    }

    pub fn close_loan(&mut self, id: LoanId) -> Result<(), LedgerError> {
        self.book.close_loan(id)
    }

    pub fn remove_loan(&mut self, id: LoanId) -> Result<Loan, LedgerError> {
        self.book.remove_loan(id)
    }

    pub fn accrued(&self, id: LoanId, as_of: DateTime<Utc>) -> Result<AccruedInterest, LedgerError> {
        self.book.accrued(id, as_of)
    }

    pub fn split_loan(
        &mut self,
        loan_id: LoanId,
        amount: Decimal,
        new_rate: Option<Decimal>,
        new_name: Option<String>,
        created_by: AccountId,
    ) -> Result<LoanId, LedgerError> {
        let (child_id, _) = self
            .book
            .split_loan(loan_id, amount, new_rate, new_name, created_by)?;
        Ok(child_id)
    }

    pub fn assign_payment_to_split(
        &mut self,
        payment_id: PaymentId,
        child_id: LoanId,
    ) -> Result<(), LedgerError> {
        self.book.assign_payment_to_split(payment_id, child_id)
    }

    // --- Payments ---

    pub fn submit_payment(
        &mut self,
        loan_id: LoanId,
        amount: Decimal,
        payment_date: DateTime<Utc>,
        details: PaymentDetails,
    ) -> Result<PaymentId, LedgerError> {
        self.book.submit_payment(loan_id, amount, payment_date, details)
    }

    /// Verify a payment and, on the pending-to-verified transition, fire
    /// the automatic cashback grants off its final interest amount.
    ///
    /// Re-verifying an already-verified payment succeeds without granting
    /// anything twice.
    pub fn verify_payment(
        &mut self,
        payment_id: PaymentId,
        actor: AccountId,
    ) -> Result<VerifyOutcome, LedgerError> {
        let outcome = self.book.verify_payment(payment_id)?;
        if outcome.newly_verified {
            self.cashback.auto_grant_for_payment(
                &self.loan_configs,
                outcome.loan_id,
                outcome.payment_id,
                outcome.interest_amount,
                actor,
            );
        }
        Ok(outcome)
    }

    pub fn unverify_payment(&mut self, payment_id: PaymentId) -> Result<(), LedgerError> {
        self.book.unverify_payment(payment_id)
    }

    pub fn edit_verified_payment(
        &mut self,
        payment_id: PaymentId,
        amount: Decimal,
        interest: Decimal,
        principal: Decimal,
    ) -> Result<(), LedgerError> {
        self.book
            .edit_verified_payment(payment_id, amount, interest, principal)
    }

    pub fn reject_payment(&mut self, payment_id: PaymentId) -> Result<(), LedgerError> {
        self.book.reject_payment(payment_id)
    }

    // --- Cashback configuration ---

    /// Add a standing cashback instruction for a loan. The loan must exist
    /// and the rate must be well-formed.
    pub fn add_loan_cashback_config(
        &mut self,
        loan_id: LoanId,
        beneficiary: AccountId,
        rate: CashbackRate,
    ) -> Result<ConfigId, LedgerError> {
        self.book.loan(loan_id)?;
        rate.validate()?;
        let config = LoanCashbackConfig::new(loan_id, beneficiary, rate);
        let id = config.id();
        self.loan_configs.push(config);
        Ok(id)
    }

    pub fn deactivate_loan_cashback_config(&mut self, id: ConfigId) -> Result<(), CashbackError> {
        let config = self
            .loan_configs
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(CashbackError::ConfigNotFound(id))?;
        config.deactivate();
        Ok(())
    }

    /// Add a standing cashback instruction for an external tracker.
    pub fn add_tracker_cashback_config(
        &mut self,
        tracker_ref: impl Into<String>,
        beneficiary: AccountId,
        rate: CashbackRate,
    ) -> Result<ConfigId, MoneyError> {
        rate.validate()?;
        let config = TrackerCashbackConfig::new(tracker_ref, beneficiary, rate);
        let id = config.id();
        self.tracker_configs.push(config);
        Ok(id)
    }

    pub fn deactivate_tracker_cashback_config(&mut self, id: ConfigId) -> Result<(), CashbackError> {
        let config = self
            .tracker_configs
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(CashbackError::ConfigNotFound(id))?;
        config.deactivate();
        Ok(())
    }

    /// Accept one tracker day, firing every matching tracker config.
    pub fn accept_tracker_day(
        &mut self,
        tracker_ref: &str,
        day: u32,
        base_amount: Decimal,
        actor: AccountId,
    ) -> Vec<TransactionId> {
        self.cashback
            .auto_grant_for_tracker(&self.tracker_configs, tracker_ref, day, base_amount, actor)
    }

    // --- Cashback movements ---

    pub fn transfer_points(
        &mut self,
        from: AccountId,
        to: AccountId,
        points: Decimal,
        note: Option<String>,
    ) -> Result<TransactionId, CashbackError> {
        self.cashback.transfer(from, to, points, note)
    }

    pub fn grant_points(
        &mut self,
        to: AccountId,
        points: Decimal,
        note: Option<String>,
        actor: AccountId,
    ) -> Result<TransactionId, CashbackError> {
        self.cashback.grant(to, points, note, actor)
    }

    pub fn grant_points_for_loan(
        &mut self,
        to: AccountId,
        points: Decimal,
        loan_id: LoanId,
        note: Option<String>,
        actor: AccountId,
    ) -> Result<TransactionId, CashbackError> {
        self.cashback.grant_for_loan(to, points, loan_id, note, actor)
    }

    pub fn deduct_points(
        &mut self,
        from: AccountId,
        points: Decimal,
        note: Option<String>,
        actor: AccountId,
    ) -> Result<TransactionId, CashbackError> {
        self.cashback.deduct(from, points, note, actor)
    }

    pub fn record_tracker_entry(
        &mut self,
        to: AccountId,
        points: Decimal,
        tracker_ref: impl Into<String>,
        day: u32,
        note: Option<String>,
        actor: AccountId,
    ) -> Result<TransactionId, CashbackError> {
        self.cashback
            .record_tracker_entry(to, points, tracker_ref, day, note, actor)
    }

    // --- Redemptions ---

    pub fn request_redemption(
        &mut self,
        user: AccountId,
        amount: Decimal,
        redemption_type: RedemptionType,
        payout: PayoutDetails,
    ) -> Result<RedemptionId, RedemptionError> {
        self.redemptions
            .request(&mut self.cashback, user, amount, redemption_type, payout)
    }

    pub fn complete_redemption(
        &mut self,
        id: RedemptionId,
        admin: AccountId,
        notes: Option<String>,
    ) -> Result<(), RedemptionError> {
        self.redemptions.complete(id, admin, notes)
    }

    pub fn cancel_redemption(
        &mut self,
        id: RedemptionId,
        admin: AccountId,
        notes: Option<String>,
    ) -> Result<(), RedemptionError> {
        self.redemptions.cancel(&mut self.cashback, id, admin, notes)
    }
}
