//! Store-backed health indicator.

use async_trait::async_trait;

use crate::health::{Health, HealthIndicator, HealthStatus};
use crate::manager::AccountManager;

/// Reports UP while the store holds at least one account.
#[derive(Clone)]
pub struct AccountHealthCheck {
    manager: AccountManager,
}

impl AccountHealthCheck {
    pub fn new(manager: AccountManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl HealthIndicator for AccountHealthCheck {
    async fn health(&self) -> Health {
        match self.manager.count_accounts().await {
            Ok(0) => Health::new(HealthStatus::NoAccounts).with_detail("count", 0),
            Ok(count) => Health::new(HealthStatus::Up).with_detail("count", count),
            Err(e) => {
                tracing::warn!(error = %e, "Account health check failed");
                Health::new(HealthStatus::Down).with_detail("error", e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Account;
    use crate::store::InMemoryAccountStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_then_up() {
        let manager = AccountManager::new(Arc::new(InMemoryAccountStore::new()));
        let check = AccountHealthCheck::new(manager.clone());

        let health = check.health().await;
        assert_eq!(health.status, HealthStatus::NoAccounts);
        assert_eq!(health.details["count"], 0);

        manager.save(Account::new("1234567890", "John Doe")).await.unwrap();
        let health = check.health().await;
        assert!(health.status.is_up());
        assert_eq!(health.details["count"], 1);
    }
}
