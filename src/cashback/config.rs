use crate::core::account::AccountId;
use crate::core::loan::LoanId;
use crate::core::money::{self, round_money, MoneyError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How cashback points are computed from verified interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashbackRate {
    /// Fraction of the verified interest amount: 0.05 = 5%.
    Percentage(Decimal),
    /// Flat number of points per verified payment.
    Fixed(Decimal),
}

impl CashbackRate {
    /// Points earned for a verified payment carrying `interest` of interest,
    /// rounded to 2 decimals half-up.
    pub fn points_for(&self, interest: Decimal) -> Decimal {
        match self {
            CashbackRate::Percentage(rate) => round_money(interest * rate),
            CashbackRate::Fixed(points) => round_money(*points),
        }
    }

    pub fn validate(&self) -> Result<(), MoneyError> {
        match self {
            CashbackRate::Percentage(rate) => money::validate_rate(*rate),
            CashbackRate::Fixed(points) => money::validate_positive(*points),
        }
    }
}

impl fmt::Display for CashbackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CashbackRate::Percentage(rate) => write!(f, "{}%", rate * Decimal::ONE_HUNDRED),
            CashbackRate::Fixed(points) => write!(f, "{} pts", points),
        }
    }
}

/// Unique identifier for a cashback configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(Uuid);

impl ConfigId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConfigId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standing instruction: when a payment against `loan_id` is verified,
/// grant `rate`-derived points to `beneficiary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanCashbackConfig {
    id: ConfigId,
    loan_id: LoanId,
    beneficiary: AccountId,
    rate: CashbackRate,
    active: bool,
}

impl LoanCashbackConfig {
    pub fn new(loan_id: LoanId, beneficiary: AccountId, rate: CashbackRate) -> Self {
        Self {
            id: ConfigId::new(),
            loan_id,
            beneficiary,
            rate,
            active: true,
        }
    }

    pub fn id(&self) -> ConfigId {
        self.id
    }

    pub fn loan_id(&self) -> LoanId {
        self.loan_id
    }

    pub fn beneficiary(&self) -> &AccountId {
        &self.beneficiary
    }

    pub fn rate(&self) -> CashbackRate {
        self.rate
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }
}

/// Standing instruction: when a day's entry for `tracker_ref` is
/// accepted, grant `rate`-derived points to `beneficiary`. The tracker
/// itself lives outside the ledger; only its reference string is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerCashbackConfig {
    id: ConfigId,
    tracker_ref: String,
    beneficiary: AccountId,
    rate: CashbackRate,
    active: bool,
}

impl TrackerCashbackConfig {
    pub fn new(tracker_ref: impl Into<String>, beneficiary: AccountId, rate: CashbackRate) -> Self {
        Self {
            id: ConfigId::new(),
            tracker_ref: tracker_ref.into(),
            beneficiary,
            rate,
            active: true,
        }
    }

    pub fn id(&self) -> ConfigId {
        self.id
    }

    pub fn tracker_ref(&self) -> &str {
        &self.tracker_ref
    }

    pub fn beneficiary(&self) -> &AccountId {
        &self.beneficiary
    }

    pub fn rate(&self) -> CashbackRate {
        self.rate
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percentage_points_round_half_up() {
        let rate = CashbackRate::Percentage(dec!(0.05));
        assert_eq!(rate.points_for(dec!(200)), dec!(10.00));
        // 862.33 * 0.05 = 43.1165 → 43.12
        assert_eq!(rate.points_for(dec!(862.33)), dec!(43.12));
    }

    #[test]
    fn test_fixed_points_ignore_interest() {
        let rate = CashbackRate::Fixed(dec!(25));
        assert_eq!(rate.points_for(dec!(1)), dec!(25.00));
        assert_eq!(rate.points_for(dec!(99999)), dec!(25.00));
    }

    #[test]
    fn test_rate_validation() {
        assert!(CashbackRate::Percentage(dec!(0.05)).validate().is_ok());
        assert!(CashbackRate::Percentage(dec!(1.5)).validate().is_err());
        assert!(CashbackRate::Fixed(dec!(-1)).validate().is_err());
    }

    #[test]
    fn test_config_starts_active() {
        let mut cfg = LoanCashbackConfig::new(
            LoanId::new(),
            AccountId::new("alice"),
            CashbackRate::Percentage(dec!(0.05)),
        );
        assert!(cfg.is_active());
        cfg.deactivate();
        assert!(!cfg.is_active());
    }
}
