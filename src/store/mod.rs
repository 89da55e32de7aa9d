//! Account persistence.
//!
//! # Data Flow
//! ```text
//! AccountManager
//!     → observed.rs (store reads pass through the interceptor)
//!     → AccountStore implementation (memory.rs by default)
//! ```
//!
//! # Design Decisions
//! - The store owns durable state between requests
//! - Single-account read-modify-write goes through `update`, which the
//!   store runs atomically per account id
//! - Ids are assigned by the store on first save

pub mod memory;
pub mod observed;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Account, AccountError, AccountId};

pub use memory::InMemoryAccountStore;
pub use observed::ObservedStore;

/// Errors reported by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No account with this id.
    #[error("no account with id {0}")]
    NotFound(AccountId),

    /// Another account already uses this number.
    #[error("an account with number '{0}' already exists")]
    DuplicateNumber(String),

    /// The mutation passed to `update` rejected the change.
    #[error(transparent)]
    Rejected(#[from] AccountError),

    /// Backing storage failed or is unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A change applied to one account inside [`AccountStore::update`].
pub type AccountMutation = Box<dyn FnOnce(&mut Account) -> Result<(), AccountError> + Send>;

/// Repository of accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Look up by the external key (card number).
    async fn find_by_number(&self, number: &str) -> StoreResult<Option<Account>>;

    /// All accounts, ordered by id.
    async fn find_all(&self) -> StoreResult<Vec<Account>>;

    async fn count(&self) -> StoreResult<u64>;

    /// Insert or replace an account, assigning an id if it has none.
    async fn save(&self, account: Account) -> StoreResult<Account>;

    /// Apply `mutation` to the stored account atomically.
    ///
    /// The stored account is replaced only if the mutation succeeds.
    async fn update(&self, id: AccountId, mutation: AccountMutation) -> StoreResult<Account>;
}
