//! Store decorator that routes reads through the interceptor.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{Account, AccountId};
use crate::observability::{ops, Interceptor};
use crate::store::{AccountMutation, AccountStore, StoreResult};

/// Wraps a store so that every read is an observable operation.
pub struct ObservedStore<S> {
    inner: S,
    interceptor: Arc<Interceptor>,
}

impl<S: AccountStore> ObservedStore<S> {
    pub fn new(inner: S, interceptor: Arc<Interceptor>) -> Self {
        Self { inner, interceptor }
    }
}

#[async_trait]
impl<S: AccountStore> AccountStore for ObservedStore<S> {
    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        self.interceptor
            .observe(ops::STORE_FIND_BY_ID, self.inner.find_by_id(id))
            .await
    }

    async fn find_by_number(&self, number: &str) -> StoreResult<Option<Account>> {
        self.interceptor
            .observe(ops::STORE_FIND_BY_NUMBER, self.inner.find_by_number(number))
            .await
    }

    async fn find_all(&self) -> StoreResult<Vec<Account>> {
        self.interceptor
            .observe(ops::STORE_FIND_ALL, self.inner.find_all())
            .await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.interceptor
            .observe(ops::STORE_COUNT, self.inner.count())
            .await
    }

    async fn save(&self, account: Account) -> StoreResult<Account> {
        self.inner.save(account).await
    }

    async fn update(&self, id: AccountId, mutation: AccountMutation) -> StoreResult<Account> {
        self.inner.update(id, mutation).await
    }
}
