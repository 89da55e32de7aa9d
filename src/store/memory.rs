//! In-memory account store.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::{Account, AccountId};
use crate::store::{AccountMutation, AccountStore, StoreError, StoreResult};

/// A thread-safe store keeping accounts in memory.
///
/// Reads run concurrently; writes to one id are serialized by the map's
/// shard lock.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: DashMap<AccountId, Account>,
    /// Account number -> id.
    numbers: DashMap<String, AccountId>,
    next_id: AtomicI64,
}

impl InMemoryAccountStore {
    /// Create an empty store whose first assigned id is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose first assigned id is `first_id`.
    pub fn with_first_id(first_id: AccountId) -> Self {
        Self {
            next_id: AtomicI64::new(first_id),
            ..Self::default()
        }
    }

    fn insert_new(&self, mut account: Account) -> StoreResult<Account> {
        if self.numbers.contains_key(account.number()) {
            return Err(StoreError::DuplicateNumber(account.number().to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        account.set_id(id);

        match self.numbers.entry(account.number().to_string()) {
            Entry::Occupied(_) => {
                return Err(StoreError::DuplicateNumber(account.number().to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        self.accounts.insert(id, account.clone());
        Ok(account)
    }

    fn replace(&self, id: AccountId, account: Account) -> StoreResult<Account> {
        let previous_number = self.accounts.get(&id).map(|a| a.number().to_string());

        match self.numbers.entry(account.number().to_string()) {
            Entry::Occupied(owner) if *owner.get() != id => {
                return Err(StoreError::DuplicateNumber(account.number().to_string()));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        if let Some(previous) = previous_number.filter(|n| n != account.number()) {
            self.numbers.remove(&previous);
        }

        self.accounts.insert(id, account.clone());
        self.next_id.fetch_max(id + 1, Ordering::SeqCst);
        Ok(account)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_number(&self, number: &str) -> StoreResult<Option<Account>> {
        let id = match self.numbers.get(number) {
            Some(r) => *r.value(),
            None => return Ok(None),
        };
        Ok(self.accounts.get(&id).map(|r| r.value().clone()))
    }

    async fn find_all(&self) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self.accounts.iter().map(|r| r.value().clone()).collect();
        accounts.sort_by_key(|a| a.id());
        Ok(accounts)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.accounts.len() as u64)
    }

    async fn save(&self, account: Account) -> StoreResult<Account> {
        match account.id() {
            Some(id) => self.replace(id, account),
            None => self.insert_new(account),
        }
    }

    async fn update(&self, id: AccountId, mutation: AccountMutation) -> StoreResult<Account> {
        let mut stored = self.accounts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let mut working = stored.value().clone();
        mutation(&mut working)?;
        *stored.value_mut() = working.clone();
        Ok(working)
    }
}
