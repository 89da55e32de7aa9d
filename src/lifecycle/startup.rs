//! Startup orchestration.
//!
//! # Responsibilities
//! - Create the configured seed accounts
//! - Report how many accounts the service starts with

use crate::config::SeedAccount;
use crate::domain::Account;
use crate::manager::{AccountManager, ManagerError, ManagerResult};

/// Save every seed account, in order. Stops at the first failure.
pub async fn seed_accounts(manager: &AccountManager, seeds: &[SeedAccount]) -> ManagerResult<usize> {
    for seed in seeds {
        let mut account = Account::new(seed.number.clone(), seed.name.clone());
        for beneficiary in &seed.beneficiaries {
            account
                .add_beneficiary(beneficiary.name.clone(), beneficiary.allocation)
                .map_err(ManagerError::from)?;
        }
        let saved = manager.save(account).await?;
        tracing::debug!(id = ?saved.id(), number = %saved.number(), "Seed account created");
    }
    Ok(seeds.len())
}

/// Log the greeting with the current account count.
pub async fn report_account_count(manager: &AccountManager) -> ManagerResult<u64> {
    let count = manager.count_accounts().await?;
    tracing::info!("Hello, there are {} accounts", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedBeneficiary;
    use crate::store::InMemoryAccountStore;
    use std::sync::Arc;

    fn seed(number: &str, beneficiaries: &[(&str, &str)]) -> SeedAccount {
        SeedAccount {
            number: number.into(),
            name: "John Doe".into(),
            beneficiaries: beneficiaries
                .iter()
                .map(|(name, pct)| SeedBeneficiary {
                    name: name.to_string(),
                    allocation: pct.parse().unwrap(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_seed_and_report() {
        let manager = AccountManager::new(Arc::new(InMemoryAccountStore::new()));
        let seeds = [
            seed("1234567890", &[("Jane Doe", "0.5"), ("Junior Doe", "0.5")]),
            seed("1234567891", &[]),
        ];

        assert_eq!(seed_accounts(&manager, &seeds).await.unwrap(), 2);
        assert_eq!(report_account_count(&manager).await.unwrap(), 2);

        let first = manager.get_account(0).await.unwrap();
        assert_eq!(first.beneficiaries().len(), 2);
        assert!(first.is_valid());
    }

    #[tokio::test]
    async fn test_seed_duplicate_number_fails() {
        let manager = AccountManager::new(Arc::new(InMemoryAccountStore::new()));
        let seeds = [seed("1", &[]), seed("1", &[])];
        assert!(matches!(
            seed_accounts(&manager, &seeds).await,
            Err(ManagerError::Validation(_))
        ));
    }
}
