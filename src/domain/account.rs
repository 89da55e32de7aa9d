//! Account aggregate and its beneficiaries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::error::AccountError;
use crate::domain::percentage::Percentage;

/// Store-assigned account identifier.
pub type AccountId = i64;

/// A named recipient of a share of an account's rewards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    name: String,
    allocation_percentage: Percentage,
}

impl Beneficiary {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allocation_percentage(&self) -> Percentage {
        self.allocation_percentage
    }
}

/// A holder's account and its ordered beneficiaries.
///
/// Invariants, checked on every mutation:
/// - beneficiary names are unique (exact, case-sensitive match)
/// - the allocations sum to at most 1
///
/// A rejected mutation leaves the account exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AccountRecord")]
pub struct Account {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<AccountId>,
    number: String,
    name: String,
    beneficiaries: Vec<Beneficiary>,
}

impl Account {
    /// Create an unsaved account with no beneficiaries.
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            number: number.into(),
            name: name.into(),
            beneficiaries: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<AccountId> {
        self.id
    }

    /// Assign the persistent identifier. Called by stores on first save.
    pub fn set_id(&mut self, id: AccountId) {
        self.id = Some(id);
    }

    /// Drop the identifier so the account is treated as new.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn beneficiaries(&self) -> &[Beneficiary] {
        &self.beneficiaries
    }

    /// Add a beneficiary at the end of the list.
    pub fn add_beneficiary(
        &mut self,
        name: impl Into<String>,
        allocation: Percentage,
    ) -> Result<(), AccountError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AccountError::InvalidBeneficiaryName);
        }
        if self.position(&name).is_some() {
            return Err(AccountError::DuplicateBeneficiary(name));
        }

        let total = self.total_allocation() + allocation.value();
        if total > Decimal::ONE {
            return Err(AccountError::AllocationExceeded { name, total });
        }

        self.beneficiaries.push(Beneficiary {
            name,
            allocation_percentage: allocation,
        });
        Ok(())
    }

    /// Remove the named beneficiary, keeping the order of the others.
    pub fn remove_beneficiary(&mut self, name: &str) -> Result<Beneficiary, AccountError> {
        let index = self
            .position(name)
            .ok_or_else(|| AccountError::BeneficiaryNotFound(name.to_string()))?;
        Ok(self.beneficiaries.remove(index))
    }

    pub fn beneficiary(&self, name: &str) -> Result<&Beneficiary, AccountError> {
        self.beneficiaries
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| AccountError::BeneficiaryNotFound(name.to_string()))
    }

    /// Replace the allocation of several beneficiaries at once.
    ///
    /// Either every change is applied or none is.
    pub fn update_allocations(
        &mut self,
        allocations: &HashMap<String, Percentage>,
    ) -> Result<(), AccountError> {
        let mut updated = self.beneficiaries.clone();
        for (name, allocation) in allocations {
            let beneficiary = updated
                .iter_mut()
                .find(|b| &b.name == name)
                .ok_or_else(|| AccountError::BeneficiaryNotFound(name.clone()))?;
            beneficiary.allocation_percentage = *allocation;
        }

        let mut running = Decimal::ZERO;
        for beneficiary in &updated {
            running += beneficiary.allocation_percentage.value();
            if running > Decimal::ONE {
                let total = updated
                    .iter()
                    .map(|b| b.allocation_percentage.value())
                    .sum();
                return Err(AccountError::AllocationExceeded {
                    name: beneficiary.name.clone(),
                    total,
                });
            }
        }

        self.beneficiaries = updated;
        Ok(())
    }

    /// Sum of all beneficiary allocations.
    pub fn total_allocation(&self) -> Decimal {
        self.beneficiaries
            .iter()
            .map(|b| b.allocation_percentage.value())
            .sum()
    }

    /// True when the allocations add up to no more than 100%.
    pub fn is_valid(&self) -> bool {
        self.total_allocation() <= Decimal::ONE
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.beneficiaries.iter().position(|b| b.name == name)
    }
}

/// Wire form of an account, decoded without the aggregate rules.
///
/// Turn it into an [`Account`] with `Account::try_from`, which replays every
/// beneficiary through [`Account::add_beneficiary`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    #[serde(default)]
    id: Option<AccountId>,
    #[serde(default)]
    number: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    beneficiaries: Vec<Beneficiary>,
}

impl TryFrom<AccountRecord> for Account {
    type Error = AccountError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let mut account = Account::new(record.number, record.name);
        account.id = record.id;
        for beneficiary in record.beneficiaries {
            account.add_beneficiary(beneficiary.name, beneficiary.allocation_percentage)?;
        }
        Ok(account)
    }
}
