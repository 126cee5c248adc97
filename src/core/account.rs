use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for an account holder in the ledger.
///
/// An account can represent a borrower, a cashback beneficiary, an admin,
/// or the designated house/system account used as the counter-party for
/// deductions and redemptions.
///
/// # Examples
///
/// ```
/// use lending_ledger::core::account::AccountId;
///
/// let alice = AccountId::new("alice");
/// let system = AccountId::new("HOUSE");
/// assert_ne!(alice, system);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this account ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
