use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use thiserror::Error;

/// Day-count divisor for converting an annual rate to a daily rate.
/// The ledger uses ACT/365 everywhere.
pub const DAYS_PER_YEAR: u32 = 365;

/// Months per year, for the monthly-basis accrual.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Tolerance applied when comparing quoted money values that were rounded
/// independently (one paisa).
pub const MONEY_EPSILON: Decimal = dec!(0.01);

/// Errors arising from rate and amount validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("interest rate must be a fraction in [0, 1], got {rate}")]
    InvalidRate { rate: Decimal },
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },
}

/// Round a money value to 2 decimal places, half-up.
///
/// Applied at the point a value becomes a stored or quoted amount,
/// never on intermediate accumulation.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Daily rate for an annual rate expressed as a fraction (0.21 = 21%).
pub fn daily_rate(annual_rate: Decimal) -> Decimal {
    annual_rate / Decimal::from(DAYS_PER_YEAR)
}

/// Monthly rate for an annual rate expressed as a fraction.
pub fn monthly_rate(annual_rate: Decimal) -> Decimal {
    annual_rate / Decimal::from(MONTHS_PER_YEAR)
}

/// Interest accrued on `principal` at `annual_rate` over `days` whole days.
///
/// Returns the raw (unrounded) value; callers round when quoting.
pub fn interest_for_days(principal: Decimal, annual_rate: Decimal, days: i64) -> Decimal {
    if days <= 0 {
        return Decimal::ZERO;
    }
    principal * daily_rate(annual_rate) * Decimal::from(days)
}

/// One day of interest on `principal`, quoted to 2 decimals.
pub fn daily_interest(principal: Decimal, annual_rate: Decimal) -> Decimal {
    round_money(principal * daily_rate(annual_rate))
}

/// One month of interest on `principal`, quoted to 2 decimals.
pub fn monthly_interest(principal: Decimal, annual_rate: Decimal) -> Decimal {
    round_money(principal * monthly_rate(annual_rate))
}

/// Validate that a rate is a fraction in `[0, 1]`.
pub fn validate_rate(rate: Decimal) -> Result<(), MoneyError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(MoneyError::InvalidRate { rate });
    }
    Ok(())
}

/// Validate that a money amount is strictly positive.
pub fn validate_positive(amount: Decimal) -> Result<(), MoneyError> {
    if amount <= Decimal::ZERO {
        return Err(MoneyError::NonPositiveAmount { amount });
    }
    Ok(())
}
