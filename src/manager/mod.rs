//! Account manager.
//!
//! # Responsibilities
//! - Orchestrate domain operations against the store
//! - Validate accounts before they are persisted
//! - Translate store failures into manager errors
//!
//! # Design Decisions
//! - No locking here: read-modify-write goes through `AccountStore::update`
//! - Domain invariant violations are surfaced unchanged as `Domain(..)`

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{Account, AccountError, AccountId, Percentage};
use crate::store::{AccountStore, StoreError};

/// Errors returned by [`AccountManager`].
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Account or beneficiary does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// Domain invariant violated.
    #[error(transparent)]
    Domain(AccountError),

    /// Store failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for ManagerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ManagerError::NotFound(no_such_account(id)),
            StoreError::DuplicateNumber(number) => {
                ManagerError::Validation(format!("an account with number '{number}' already exists"))
            }
            StoreError::Rejected(e) => e.into(),
            StoreError::Unavailable(msg) => ManagerError::Storage(msg),
        }
    }
}

impl From<AccountError> for ManagerError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::BeneficiaryNotFound(_) => ManagerError::NotFound(err.to_string()),
            AccountError::InvalidBeneficiaryName => ManagerError::Validation(err.to_string()),
            other => ManagerError::Domain(other),
        }
    }
}

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

fn no_such_account(id: AccountId) -> String {
    format!("No such account with id {id}")
}

/// All accounts from one `get_all_accounts` call.
///
/// Consumed once; not restartable.
#[derive(Debug)]
pub struct Accounts {
    inner: std::vec::IntoIter<Account>,
}

impl Iterator for Accounts {
    type Item = Account;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Accounts {}

/// Entry point for every account operation.
#[derive(Clone)]
pub struct AccountManager {
    store: Arc<dyn AccountStore>,
}

impl AccountManager {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    pub async fn get_account(&self, id: AccountId) -> ManagerResult<Account> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ManagerError::NotFound(no_such_account(id)))
    }

    pub async fn get_all_accounts(&self) -> ManagerResult<Accounts> {
        let accounts = self.store.find_all().await?;
        Ok(Accounts {
            inner: accounts.into_iter(),
        })
    }

    pub async fn count_accounts(&self) -> ManagerResult<u64> {
        Ok(self.store.count().await?)
    }

    /// Validate and persist an account, assigning an id if it has none.
    pub async fn save(&self, account: Account) -> ManagerResult<Account> {
        if account.name().trim().is_empty() {
            return Err(ManagerError::Validation("account name must not be empty".into()));
        }
        if account.number().trim().is_empty() {
            return Err(ManagerError::Validation("account number must not be empty".into()));
        }

        if let Some(existing) = self.store.find_by_number(account.number()).await? {
            if existing.id() != account.id() {
                return Err(ManagerError::Validation(format!(
                    "an account with number '{}' already exists",
                    account.number()
                )));
            }
        }

        let saved = self.store.save(account).await?;
        tracing::info!(id = ?saved.id(), number = %saved.number(), "Account saved");
        Ok(saved)
    }

    /// Add a beneficiary with a zero allocation, to be allocated later.
    pub async fn add_beneficiary(&self, account_id: AccountId, name: &str) -> ManagerResult<Account> {
        self.add_beneficiary_with_allocation(account_id, name, Percentage::zero())
            .await
    }

    pub async fn add_beneficiary_with_allocation(
        &self,
        account_id: AccountId,
        name: &str,
        allocation: Percentage,
    ) -> ManagerResult<Account> {
        let name = name.to_string();
        let account = self
            .store
            .update(
                account_id,
                Box::new(move |account| account.add_beneficiary(name, allocation)),
            )
            .await?;
        tracing::debug!(account_id, "Beneficiary added");
        Ok(account)
    }

    pub async fn remove_beneficiary(&self, account_id: AccountId, name: &str) -> ManagerResult<Account> {
        let name = name.to_string();
        let account = self
            .store
            .update(
                account_id,
                Box::new(move |account| account.remove_beneficiary(&name).map(|_| ())),
            )
            .await?;
        tracing::debug!(account_id, "Beneficiary removed");
        Ok(account)
    }

    /// Set the allocation of several beneficiaries in one atomic change.
    pub async fn update_beneficiary_allocations(
        &self,
        account_id: AccountId,
        allocations: HashMap<String, Percentage>,
    ) -> ManagerResult<Account> {
        let account = self
            .store
            .update(
                account_id,
                Box::new(move |account| account.update_allocations(&allocations)),
            )
            .await?;
        Ok(account)
    }
}
