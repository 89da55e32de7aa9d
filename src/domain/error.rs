//! Domain error definitions.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised when constructing a [`Percentage`](super::Percentage).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PercentageError {
    /// Value outside the closed interval [0, 1].
    #[error("percentage {0} is outside the range [0, 1]")]
    OutOfRange(Decimal),

    /// Value could not be parsed as a decimal.
    #[error("invalid percentage: {0}")]
    Invalid(String),
}

/// Invariant violations on the account aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// A beneficiary with this exact name already exists.
    #[error("beneficiary '{0}' already exists on this account")]
    DuplicateBeneficiary(String),

    /// No beneficiary with this name.
    #[error("no beneficiary named '{0}' on this account")]
    BeneficiaryNotFound(String),

    /// The change would push the total allocation above 100%.
    #[error("allocation for '{name}' would raise the total to {total}, above 1")]
    AllocationExceeded { name: String, total: Decimal },

    /// Beneficiary names must not be blank.
    #[error("beneficiary name must not be empty")]
    InvalidBeneficiaryName,
}
