//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health (unauthenticated)
//!     → HealthIndicator::health()
//!     → accounts.rs (store count)
//!     → Health { status, details }
//!     → 200 when UP, 503 otherwise
//! ```
//!
//! # Design Decisions
//! - Indicators are async traits so they can query the store
//! - An empty store is reported distinctly from a failing one

pub mod accounts;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

pub use accounts::AccountHealthCheck;

/// Overall status reported by an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Up,
    NoAccounts,
    Down,
}

impl HealthStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, HealthStatus::Up)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl Health {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
pub trait HealthIndicator: Send + Sync {
    async fn health(&self) -> Health;
}
