use crate::core::account::AccountId;
use crate::core::loan::{Loan, LoanId, LoanSplit, LoanType, PaymentFrequency, SplitId};
use crate::core::money::{self, MoneyError, MONEY_EPSILON};
use crate::core::payment::{Payment, PaymentId, PaymentStatus};
use crate::ledger::accrual::{accrued_interest, AccruedInterest};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A split-loan child is auto-closed once its balance drops to this or below.
const AUTO_CLOSE_THRESHOLD: Decimal = dec!(0.01);

/// Errors arising from loan book operations.
///
/// Every operation validates completely before writing anything, so a
/// returned error implies zero partial effects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("loan {0} not found")]
    LoanNotFound(LoanId),
    #[error("payment {0} not found")]
    PaymentNotFound(PaymentId),
    #[error(transparent)]
    Money(#[from] MoneyError),
    #[error("loan {0} is closed")]
    LoanClosed(LoanId),
    #[error("payment amount {amount} exceeds pending interest {pending}")]
    AmountExceedsPendingInterest { amount: Decimal, pending: Decimal },
    #[error("interest {interest} + principal {principal} must equal amount {amount}")]
    AmountMismatch {
        amount: Decimal,
        interest: Decimal,
        principal: Decimal,
    },
    #[error("cannot verify rejected payment {0}")]
    CannotVerifyRejected(PaymentId),
    #[error("payment {0} is not verified")]
    NotVerified(PaymentId),
    #[error("payment {0} is not pending")]
    NotPending(PaymentId),
    #[error("split amount {amount} must be positive and below remaining principal {remaining}")]
    InvalidSplitAmount { amount: Decimal, remaining: Decimal },
    #[error("loan {child} is not a split of loan {parent}")]
    NotASplit { parent: LoanId, child: LoanId },
    #[error("loan {0} has recorded payments and cannot be removed")]
    LoanHasPayments(LoanId),
}

/// Optional attachments recorded on a submitted payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub transaction_ref: Option<String>,
    pub payment_method: Option<String>,
    pub proof_ref: Option<String>,
}

/// Result of a verification attempt.
///
/// `newly_verified` is false when the payment was already verified; the
/// call is an idempotent no-op in that case and nothing downstream
/// (balance, cashback) may fire again.
#[derive(Debug, Clone, Copy)]
pub struct VerifyOutcome {
    pub payment_id: PaymentId,
    pub loan_id: LoanId,
    pub interest_amount: Decimal,
    pub newly_verified: bool,
}

/// The loan ledger: owns loans, payments and split records.
///
/// Payment verification is the only path that mutates
/// `Loan::remaining_principal` (besides splitting and explicit admin
/// edits), and all multi-record operations apply as one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanBook {
    loans: HashMap<LoanId, Loan>,
    payments: Vec<Payment>,
    splits: Vec<LoanSplit>,
}

impl LoanBook {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Loans ---

    /// Create a new active loan.
    pub fn create_loan(
        &mut self,
        customer: AccountId,
        name: impl Into<String>,
        principal: Decimal,
        annual_rate: Decimal,
        frequency: PaymentFrequency,
        loan_type: LoanType,
    ) -> Result<LoanId, LedgerError> {
        money::validate_positive(principal)?;
        money::validate_rate(annual_rate)?;
        self.add_loan(Loan::new(
            customer, name, principal, annual_rate, frequency, loan_type,
        ))
    }

    /// Add a pre-built loan (e.g. one backdated via `Loan::with_created_at`).
    pub fn add_loan(&mut self, loan: Loan) -> Result<LoanId, LedgerError> {
        money::validate_rate(loan.annual_rate())?;
        let id = loan.id();
        debug!("loan {} added: {} @ {}", id, loan.principal_amount(), loan.annual_rate());
        self.loans.insert(id, loan);
        Ok(id)
    }

    pub fn loan(&self, id: LoanId) -> Result<&Loan, LedgerError> {
        self.loans.get(&id).ok_or(LedgerError::LoanNotFound(id))
    }

    pub fn loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.values()
    }

    /// Admin principal edit. Re-derives the remaining balance from the
    /// delta in the original principal, clamped at zero.
    pub fn edit_loan_principal(
        &mut self,
        id: LoanId,
        new_principal: Decimal,
    ) -> Result<(), LedgerError> {
        money::validate_positive(new_principal)?;
        let loan = self.loans.get_mut(&id).ok_or(LedgerError::LoanNotFound(id))?;
        let delta = new_principal - loan.principal_amount();
        loan.set_principal_amount(new_principal);
        if delta >= Decimal::ZERO {
            loan.credit_principal(delta);
        } else {
            loan.debit_principal(-delta);
        }
        Ok(())
    }

    pub fn edit_loan_rate(&mut self, id: LoanId, new_rate: Decimal) -> Result<(), LedgerError> {
        money::validate_rate(new_rate)?;
        let loan = self.loans.get_mut(&id).ok_or(LedgerError::LoanNotFound(id))?;
        loan.set_annual_rate(new_rate);
        Ok(())
    }

    pub fn close_loan(&mut self, id: LoanId) -> Result<(), LedgerError> {
        let loan = self.loans.get_mut(&id).ok_or(LedgerError::LoanNotFound(id))?;
        loan.close();
        Ok(())
    }

    /// Remove a loan. Refused when any payment references it: loans with
    /// payment history are never physically deleted.
    pub fn remove_loan(&mut self, id: LoanId) -> Result<Loan, LedgerError> {
        self.loan(id)?;
        let referenced = self
            .payments
            .iter()
            .any(|p| p.loan_id() == id || p.split_loan_id() == Some(id));
        if referenced {
            return Err(LedgerError::LoanHasPayments(id));
        }
        self.loans.remove(&id).ok_or(LedgerError::LoanNotFound(id))
    }

    // --- Payments ---

    pub fn payment(&self, id: PaymentId) -> Result<&Payment, LedgerError> {
        self.payments
            .iter()
            .find(|p| p.id() == id)
            .ok_or(LedgerError::PaymentNotFound(id))
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn payments_for_loan(&self, loan_id: LoanId) -> impl Iterator<Item = &Payment> {
        self.payments.iter().filter(move |p| p.loan_id() == loan_id)
    }

    /// Sum of interest across this loan's verified payments.
    pub fn verified_interest_paid(&self, loan_id: LoanId) -> Decimal {
        self.payments_for_loan(loan_id)
            .filter(|p| p.status() == PaymentStatus::Verified)
            .map(|p| p.interest_amount())
            .sum()
    }

    /// Sum of interest across this loan's still-pending payments.
    pub fn pending_interest(&self, loan_id: LoanId) -> Decimal {
        self.payments_for_loan(loan_id)
            .filter(|p| p.status() == PaymentStatus::Pending)
            .map(|p| p.interest_amount())
            .sum()
    }

    /// Sum of verified interest across the whole book (reporting).
    pub fn total_verified_interest(&self) -> Decimal {
        self.payments
            .iter()
            .filter(|p| p.status() == PaymentStatus::Verified)
            .map(|p| p.interest_amount())
            .sum()
    }

    /// Interest accrued on a loan as of `as_of`.
    pub fn accrued(&self, loan_id: LoanId, as_of: DateTime<Utc>) -> Result<AccruedInterest, LedgerError> {
        let loan = self.loan(loan_id)?;
        Ok(accrued_interest(
            loan,
            self.verified_interest_paid(loan_id),
            as_of,
        ))
    }

    /// Submit a payment against a loan, splitting it into interest and
    /// principal at submission time. The split is a snapshot: it is not
    /// recomputed later except through an explicit admin correction.
    /// No balance is mutated here.
    pub fn submit_payment(
        &mut self,
        loan_id: LoanId,
        amount: Decimal,
        payment_date: DateTime<Utc>,
        details: PaymentDetails,
    ) -> Result<PaymentId, LedgerError> {
        money::validate_positive(amount)?;
        let loan = self.loan(loan_id)?;
        if !loan.is_active() {
            return Err(LedgerError::LoanClosed(loan_id));
        }

        let interest_due = self.accrued(loan_id, payment_date)?.daily_basis;
        let loan = self.loan(loan_id)?;

        let (interest_amount, principal_amount) = match loan.loan_type() {
            LoanType::InterestOnly => {
                // Interest-only loans cap payments at accrued interest plus
                // interest already claimed by pending payments.
                let pending = interest_due + self.pending_interest(loan_id);
                if amount > pending + MONEY_EPSILON {
                    return Err(LedgerError::AmountExceedsPendingInterest { amount, pending });
                }
                (amount, Decimal::ZERO)
            }
            LoanType::Regular => {
                if amount >= interest_due {
                    (interest_due, amount - interest_due)
                } else {
                    (amount, Decimal::ZERO)
                }
            }
        };

        let mut payment = Payment::new(loan_id, amount, interest_amount, principal_amount, payment_date);
        if let Some(r) = details.transaction_ref {
            payment = payment.with_transaction_ref(r);
        }
        if let Some(m) = details.payment_method {
            payment = payment.with_payment_method(m);
        }
        if let Some(p) = details.proof_ref {
            payment = payment.with_proof_ref(p);
        }

        let id = payment.id();
        debug!(
            "payment {} submitted against loan {}: {} = {} interest + {} principal",
            id, loan_id, amount, interest_amount, principal_amount
        );
        self.payments.push(payment);
        Ok(id)
    }

    // --- Verification state machine ---

    /// Verify a pending payment, reducing the loan balance by its principal
    /// portion (regular loans only; interest-only balances never move).
    ///
    /// Idempotent: verifying an already-verified payment succeeds without
    /// reapplying any effect.
    pub fn verify_payment(&mut self, id: PaymentId) -> Result<VerifyOutcome, LedgerError> {
        let idx = self.payment_index(id)?;
        let payment = &self.payments[idx];
        let loan_id = payment.loan_id();
        let interest_amount = payment.interest_amount();
        let principal_amount = payment.principal_amount();

        match payment.status() {
            PaymentStatus::Verified => {
                return Ok(VerifyOutcome {
                    payment_id: id,
                    loan_id,
                    interest_amount,
                    newly_verified: false,
                })
            }
            PaymentStatus::Rejected => return Err(LedgerError::CannotVerifyRejected(id)),
            PaymentStatus::Pending => {}
        }

        let loan = self
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        if loan.loan_type() != LoanType::InterestOnly {
            loan.debit_principal(principal_amount);
        }
        self.payments[idx].set_status(PaymentStatus::Verified);
        info!("payment {} verified against loan {}", id, loan_id);

        Ok(VerifyOutcome {
            payment_id: id,
            loan_id,
            interest_amount,
            newly_verified: true,
        })
    }

    /// Move a verified payment back to pending, restoring its principal
    /// portion to the loan balance.
    pub fn unverify_payment(&mut self, id: PaymentId) -> Result<(), LedgerError> {
        let idx = self.payment_index(id)?;
        let payment = &self.payments[idx];
        if payment.status() != PaymentStatus::Verified {
            return Err(LedgerError::NotVerified(id));
        }
        let loan_id = payment.loan_id();
        let principal_amount = payment.principal_amount();

        let loan = self
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        if loan.loan_type() != LoanType::InterestOnly {
            loan.credit_principal(principal_amount);
        }
        self.payments[idx].set_status(PaymentStatus::Pending);
        info!("payment {} unverified against loan {}", id, loan_id);
        Ok(())
    }

    /// Correct the amounts on a verified payment, applying the principal
    /// delta to the loan balance in the same step.
    pub fn edit_verified_payment(
        &mut self,
        id: PaymentId,
        new_amount: Decimal,
        new_interest: Decimal,
        new_principal: Decimal,
    ) -> Result<(), LedgerError> {
        money::validate_positive(new_amount)?;
        if new_interest < Decimal::ZERO || new_principal < Decimal::ZERO
            || new_interest + new_principal != new_amount
        {
            return Err(LedgerError::AmountMismatch {
                amount: new_amount,
                interest: new_interest,
                principal: new_principal,
            });
        }

        let idx = self.payment_index(id)?;
        let payment = &self.payments[idx];
        if payment.status() != PaymentStatus::Verified {
            return Err(LedgerError::NotVerified(id));
        }
        let loan_id = payment.loan_id();
        let old_principal = payment.principal_amount();

        let loan = self
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        if loan.loan_type() != LoanType::InterestOnly {
            let delta = new_principal - old_principal;
            if delta >= Decimal::ZERO {
                loan.debit_principal(delta);
            } else {
                loan.credit_principal(-delta);
            }
        }
        self.payments[idx].correct_amounts(new_amount, new_interest, new_principal);
        info!("payment {} corrected: {} = {} + {}", id, new_amount, new_interest, new_principal);
        Ok(())
    }

    /// Reject a pending payment. Never touches the loan balance: a
    /// rejected payment is defined as never having happened.
    pub fn reject_payment(&mut self, id: PaymentId) -> Result<(), LedgerError> {
        let idx = self.payment_index(id)?;
        if self.payments[idx].status() != PaymentStatus::Pending {
            return Err(LedgerError::NotPending(id));
        }
        self.payments[idx].set_status(PaymentStatus::Rejected);
        info!("payment {} rejected", id);
        Ok(())
    }

    // --- Loan splitting ---

    pub fn splits(&self) -> &[LoanSplit] {
        &self.splits
    }

    pub fn splits_for_loan(&self, loan_id: LoanId) -> impl Iterator<Item = &LoanSplit> {
        self.splits
            .iter()
            .filter(move |s| s.original_loan_id() == loan_id)
    }

    /// Carve a child loan out of a loan's remaining principal.
    ///
    /// The child inherits the parent's frequency and type; rate and name
    /// may be overridden. Child creation, the split record, and the parent
    /// balance decrement apply as one unit.
    pub fn split_loan(
        &mut self,
        loan_id: LoanId,
        split_amount: Decimal,
        new_rate: Option<Decimal>,
        new_name: Option<String>,
        created_by: AccountId,
    ) -> Result<(LoanId, SplitId), LedgerError> {
        let parent = self.loan(loan_id)?;
        if split_amount <= Decimal::ZERO || split_amount >= parent.remaining_principal() {
            return Err(LedgerError::InvalidSplitAmount {
                amount: split_amount,
                remaining: parent.remaining_principal(),
            });
        }
        let rate = match new_rate {
            Some(r) => {
                money::validate_rate(r)?;
                r
            }
            None => parent.annual_rate(),
        };
        let name = new_name.unwrap_or_else(|| format!("{} - Split", parent.name()));

        let child = Loan::new(
            parent.customer().clone(),
            name,
            split_amount,
            rate,
            parent.payment_frequency(),
            parent.loan_type(),
        );
        let child_id = child.id();
        let split = LoanSplit::new(loan_id, child_id, split_amount, created_by);
        let split_id = split.id();

        let parent = self
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        parent.debit_principal(split_amount);
        self.loans.insert(child_id, child);
        self.splits.push(split);

        info!("loan {} split: {} carved into child {}", loan_id, split_amount, child_id);
        Ok((child_id, split_id))
    }

    /// Reassign a payment to a split child of its loan.
    ///
    /// Valid only when a split record links the payment's loan to `child_id`.
    /// For verified payments the child balance absorbs the principal portion
    /// immediately, and the child auto-closes once (nearly) paid off.
    pub fn assign_payment_to_split(
        &mut self,
        payment_id: PaymentId,
        child_id: LoanId,
    ) -> Result<(), LedgerError> {
        let idx = self.payment_index(payment_id)?;
        let parent_id = self.payments[idx].loan_id();
        let linked = self
            .splits
            .iter()
            .any(|s| s.original_loan_id() == parent_id && s.split_loan_id() == child_id);
        if !linked {
            return Err(LedgerError::NotASplit {
                parent: parent_id,
                child: child_id,
            });
        }
        self.loan(child_id)?;

        let principal_amount = self.payments[idx].principal_amount();
        let verified = self.payments[idx].status() == PaymentStatus::Verified;
        self.payments[idx].assign_to_split(child_id);

        if verified {
            let child = self
                .loans
                .get_mut(&child_id)
                .ok_or(LedgerError::LoanNotFound(child_id))?;
            child.debit_principal(principal_amount);
            if child.remaining_principal() <= AUTO_CLOSE_THRESHOLD {
                child.close();
                info!("split loan {} fully paid, auto-closed", child_id);
            }
        }
        Ok(())
    }

    fn payment_index(&self, id: PaymentId) -> Result<usize, LedgerError> {
        self.payments
            .iter()
            .position(|p| p.id() == id)
            .ok_or(LedgerError::PaymentNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn book_with_loan(
        principal: Decimal,
        rate: Decimal,
        loan_type: LoanType,
        days_ago: i64,
    ) -> (LoanBook, LoanId) {
        let mut book = LoanBook::new();
        let loan = Loan::new(
            AccountId::new("alice"),
            "test loan",
            principal,
            rate,
            PaymentFrequency::Daily,
            loan_type,
        )
        .with_created_at(Utc::now() - Duration::days(days_ago));
        let id = book.add_loan(loan).unwrap();
        (book, id)
    }

    #[test]
    fn test_submit_splits_interest_then_principal() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        let pid = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();
        let p = book.payment(pid).unwrap();
        // 10000 * 0.18/365 * 1 = 4.9315... → 4.93
        assert_eq!(p.interest_amount(), dec!(4.93));
        assert_eq!(p.principal_amount(), dec!(95.07));
        assert_eq!(p.status(), PaymentStatus::Pending);
        // No balance movement at submission time.
        assert_eq!(book.loan(loan_id).unwrap().remaining_principal(), dec!(10000));
    }

    #[test]
    fn test_submit_below_interest_due_is_all_interest() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 30);
        // Interest due after 30 days: 147.95
        let pid = book
            .submit_payment(loan_id, dec!(50), Utc::now(), PaymentDetails::default())
            .unwrap();
        let p = book.payment(pid).unwrap();
        assert_eq!(p.interest_amount(), dec!(50));
        assert_eq!(p.principal_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_interest_only_rejects_overpayment() {
        let (mut book, loan_id) = book_with_loan(dec!(50000), dec!(0.21), LoanType::InterestOnly, 30);
        let err = book
            .submit_payment(loan_id, dec!(900), Utc::now(), PaymentDetails::default())
            .unwrap_err();
        assert!(matches!(err, LedgerError::AmountExceedsPendingInterest { .. }));

        let pid = book
            .submit_payment(loan_id, dec!(800), Utc::now(), PaymentDetails::default())
            .unwrap();
        let p = book.payment(pid).unwrap();
        assert_eq!(p.interest_amount(), dec!(800));
        assert_eq!(p.principal_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_interest_only_counts_pending_payments() {
        let (mut book, loan_id) = book_with_loan(dec!(50000), dec!(0.21), LoanType::InterestOnly, 30);
        // First pending payment claims most of the 862.33 accrued.
        book.submit_payment(loan_id, dec!(800), Utc::now(), PaymentDetails::default())
            .unwrap();
        // Pending interest is now 862.33 + 800 = 1662.33; 1000 still fits.
        book.submit_payment(loan_id, dec!(1000), Utc::now(), PaymentDetails::default())
            .unwrap();
        // But 2000 exceeds it.
        let err = book
            .submit_payment(loan_id, dec!(2000), Utc::now(), PaymentDetails::default())
            .unwrap_err();
        assert!(matches!(err, LedgerError::AmountExceedsPendingInterest { .. }));
    }

    #[test]
    fn test_verify_moves_balance_once() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        let pid = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();

        let outcome = book.verify_payment(pid).unwrap();
        assert!(outcome.newly_verified);
        assert_eq!(book.loan(loan_id).unwrap().remaining_principal(), dec!(9904.93));

        // Idempotent: second verify succeeds but changes nothing.
        let outcome = book.verify_payment(pid).unwrap();
        assert!(!outcome.newly_verified);
        assert_eq!(book.loan(loan_id).unwrap().remaining_principal(), dec!(9904.93));
    }

    #[test]
    fn test_verify_interest_only_never_moves_balance() {
        let (mut book, loan_id) = book_with_loan(dec!(50000), dec!(0.21), LoanType::InterestOnly, 30);
        let pid = book
            .submit_payment(loan_id, dec!(800), Utc::now(), PaymentDetails::default())
            .unwrap();
        book.verify_payment(pid).unwrap();
        assert_eq!(book.loan(loan_id).unwrap().remaining_principal(), dec!(50000));
    }

    #[test]
    fn test_verify_unverify_verify_round_trip() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        let pid = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();

        book.verify_payment(pid).unwrap();
        let after_verify = book.loan(loan_id).unwrap().remaining_principal();
        book.unverify_payment(pid).unwrap();
        assert_eq!(book.loan(loan_id).unwrap().remaining_principal(), dec!(10000));
        book.verify_payment(pid).unwrap();
        assert_eq!(book.loan(loan_id).unwrap().remaining_principal(), after_verify);
    }

    #[test]
    fn test_unverify_requires_verified() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        let pid = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();
        assert_eq!(book.unverify_payment(pid), Err(LedgerError::NotVerified(pid)));
    }

    #[test]
    fn test_reject_never_touches_balance() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        let pid = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();
        book.reject_payment(pid).unwrap();
        assert_eq!(book.loan(loan_id).unwrap().remaining_principal(), dec!(10000));
        assert_eq!(book.payment(pid).unwrap().status(), PaymentStatus::Rejected);

        // A rejected payment cannot be verified.
        assert_eq!(
            book.verify_payment(pid).unwrap_err(),
            LedgerError::CannotVerifyRejected(pid)
        );
    }

    #[test]
    fn test_edit_verified_payment_applies_delta() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        let pid = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();
        book.verify_payment(pid).unwrap();
        // 9904.93 after verify; shift 10 from principal to interest.
        book.edit_verified_payment(pid, dec!(100), dec!(14.93), dec!(85.07))
            .unwrap();
        assert_eq!(book.loan(loan_id).unwrap().remaining_principal(), dec!(9914.93));
        let p = book.payment(pid).unwrap();
        assert_eq!(p.amount(), p.interest_amount() + p.principal_amount());
    }

    #[test]
    fn test_edit_verified_payment_rejects_mismatched_sum() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        let pid = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();
        book.verify_payment(pid).unwrap();
        let before = book.loan(loan_id).unwrap().remaining_principal();
        let err = book
            .edit_verified_payment(pid, dec!(100), dec!(60), dec!(50))
            .unwrap_err();
        assert!(matches!(err, LedgerError::AmountMismatch { .. }));
        assert_eq!(book.loan(loan_id).unwrap().remaining_principal(), before);
    }

    #[test]
    fn test_split_conserves_principal() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 0);
        let before = book.loan(loan_id).unwrap().remaining_principal();
        let (child_id, _) = book
            .split_loan(loan_id, dec!(4000), None, None, AccountId::new("admin"))
            .unwrap();

        let parent = book.loan(loan_id).unwrap();
        let child = book.loan(child_id).unwrap();
        assert_eq!(parent.remaining_principal() + child.principal_amount(), before);
        assert_eq!(child.remaining_principal(), dec!(4000));
        assert_eq!(child.annual_rate(), dec!(0.18));
    }

    #[test]
    fn test_split_rejects_out_of_range_amounts() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 0);
        for bad in [Decimal::ZERO, dec!(-5), dec!(10000), dec!(12000)] {
            let err = book
                .split_loan(loan_id, bad, None, None, AccountId::new("admin"))
                .unwrap_err();
            assert!(matches!(err, LedgerError::InvalidSplitAmount { .. }));
        }
    }

    #[test]
    fn test_assign_payment_to_split_requires_link() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        let other_id = book
            .add_loan(Loan::new(
                AccountId::new("bob"),
                "unrelated",
                dec!(5000),
                dec!(0.12),
                PaymentFrequency::Daily,
                LoanType::Regular,
            ))
            .unwrap();
        let pid = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();
        let err = book.assign_payment_to_split(pid, other_id).unwrap_err();
        assert!(matches!(err, LedgerError::NotASplit { .. }));
    }

    #[test]
    fn test_assign_verified_payment_debits_child_and_autocloses() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        let pid = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();
        book.verify_payment(pid).unwrap();

        // Child small enough that the payment's 95.07 principal closes it.
        let (child_id, _) = book
            .split_loan(loan_id, dec!(95.08), None, None, AccountId::new("admin"))
            .unwrap();
        book.assign_payment_to_split(pid, child_id).unwrap();

        let child = book.loan(child_id).unwrap();
        assert_eq!(child.remaining_principal(), dec!(0.01));
        assert!(!child.is_active());
        let p = book.payment(pid).unwrap();
        assert_eq!(p.split_loan_id(), Some(child_id));
        assert_eq!(p.original_principal_at_assignment(), Some(dec!(95.07)));
    }

    #[test]
    fn test_edit_loan_principal_rederives_remaining() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        let pid = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();
        book.verify_payment(pid).unwrap();
        // remaining = 9904.93; raising principal by 2000 raises remaining by 2000
        book.edit_loan_principal(loan_id, dec!(12000)).unwrap();
        let loan = book.loan(loan_id).unwrap();
        assert_eq!(loan.principal_amount(), dec!(12000));
        assert_eq!(loan.remaining_principal(), dec!(11904.93));
    }

    #[test]
    fn test_remove_loan_with_payments_refused() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        book.submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap();
        assert_eq!(
            book.remove_loan(loan_id).unwrap_err(),
            LedgerError::LoanHasPayments(loan_id)
        );

        // A loan without payments can be removed.
        let fresh = book
            .create_loan(
                AccountId::new("carol"),
                "fresh",
                dec!(100),
                dec!(0.1),
                PaymentFrequency::Monthly,
                LoanType::Regular,
            )
            .unwrap();
        assert!(book.remove_loan(fresh).is_ok());
    }

    #[test]
    fn test_submit_against_closed_loan_refused() {
        let (mut book, loan_id) = book_with_loan(dec!(10000), dec!(0.18), LoanType::Regular, 1);
        book.close_loan(loan_id).unwrap();
        let err = book
            .submit_payment(loan_id, dec!(100), Utc::now(), PaymentDetails::default())
            .unwrap_err();
        assert_eq!(err, LedgerError::LoanClosed(loan_id));
    }
}
