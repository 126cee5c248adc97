use crate::core::loan::Loan;
use crate::core::money::{interest_for_days, monthly_rate, round_money};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Days treated as one month on the monthly accrual basis.
const DAYS_PER_MONTH: i64 = 30;

/// Interest owed but not yet paid, quoted on two bases.
///
/// Both bases accrue on the loan's *original* principal from inception and
/// subtract interest already paid through verified payments, clamped at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccruedInterest {
    /// Day-count accrual: `principal * rate/365 * days - verified interest paid`.
    pub daily_basis: Decimal,
    /// Whole-month accrual: zero until 30 days have passed, then
    /// `principal * rate/12 * floor(days/30) - verified interest paid`.
    pub monthly_basis: Decimal,
}

impl AccruedInterest {
    pub const ZERO: AccruedInterest = AccruedInterest {
        daily_basis: Decimal::ZERO,
        monthly_basis: Decimal::ZERO,
    };
}

/// Compute the interest accrued on `loan` as of `as_of`.
///
/// `verified_interest_paid` is the sum of `interest_amount` across this
/// loan's verified payments; the loan book supplies it. Values are rounded
/// to 2 decimals (half-up) only here, at the quote point.
pub fn accrued_interest(
    loan: &Loan,
    verified_interest_paid: Decimal,
    as_of: DateTime<Utc>,
) -> AccruedInterest {
    let days = loan.days_elapsed(as_of);
    if days <= 0 {
        return AccruedInterest::ZERO;
    }

    let base = interest_for_days(loan.principal_amount(), loan.annual_rate(), days);
    let daily_basis = round_money((base - verified_interest_paid).max(Decimal::ZERO));

    let monthly_basis = if days < DAYS_PER_MONTH {
        Decimal::ZERO
    } else {
        let months_passed = Decimal::from(days / DAYS_PER_MONTH);
        let base = loan.principal_amount() * monthly_rate(loan.annual_rate()) * months_passed;
        round_money((base - verified_interest_paid).max(Decimal::ZERO))
    };

    AccruedInterest {
        daily_basis,
        monthly_basis,
    }
}
