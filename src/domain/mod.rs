//! Account domain model.
//!
//! # Data Flow
//! ```text
//! Manager operation (add/remove/update beneficiary)
//!     → account.rs (invariant checks on the aggregate)
//!     → percentage.rs (exact decimal arithmetic)
//!     → Ok(()) or AccountError, aggregate untouched on failure
//! ```
//!
//! # Design Decisions
//! - Fields are private; mutation only through `Account` methods
//! - Percentages are exact decimals, never binary floats
//! - Allocation total above 100% is rejected, never clamped

pub mod account;
pub mod error;
pub mod percentage;

pub use account::{Account, AccountId, AccountRecord, Beneficiary};
pub use error::{AccountError, PercentageError};
pub use percentage::Percentage;
