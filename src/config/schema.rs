//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::domain::Percentage;

/// Root configuration for the account service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Users, realm and authorization rules.
    pub security: SecurityConfig,

    /// Account store settings.
    pub store: StoreConfig,

    /// Accounts created at startup.
    pub seed: Vec<SeedAccount>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Attach the logging and metrics observers to operations.
    pub observers_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            observers_enabled: true,
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Realm announced in `WWW-Authenticate`.
    pub realm: String,

    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Known users.
    pub users: Vec<UserConfig>,

    /// Authorization rules in match order. `None` uses the built-in table.
    pub rules: Option<Vec<RuleConfig>>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        let user = |name: &str, roles: &[&str]| UserConfig {
            username: name.to_string(),
            password: Some(name.to_string()),
            password_sha256: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        };

        Self {
            realm: "accounts".to_string(),
            max_body_size: 64 * 1024,
            users: vec![
                user("user", &["USER"]),
                user("admin", &["USER", "ADMIN"]),
                user("superadmin", &["USER", "ADMIN", "SUPERADMIN"]),
            ],
            rules: None,
        }
    }
}

/// A user entry. Exactly one of `password` / `password_sha256` must be set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub username: String,

    /// Plaintext password, digested on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Hex SHA-256 of `username:password`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_sha256: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,
}

/// One authorization rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    /// HTTP method, or `*` for any.
    pub method: String,

    /// Path pattern (`/accounts/**`, `/accounts/{id}`).
    pub path: String,

    #[serde(default)]
    pub roles: Vec<String>,

    /// Let every caller through, with or without credentials. `roles` is
    /// ignored.
    #[serde(default)]
    pub anonymous: bool,
}

/// Account store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// First id handed out by the in-memory store.
    pub first_id: i64,
}

/// An account created at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedAccount {
    pub number: String,
    pub name: String,
    #[serde(default)]
    pub beneficiaries: Vec<SeedBeneficiary>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedBeneficiary {
    pub name: String,
    #[serde(default)]
    pub allocation: Percentage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert_eq!(config.security.users.len(), 3);
        assert!(config.security.rules.is_none());
        assert!(config.seed.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [observability]
            log_format = "json"
            metrics_enabled = true

            [security]
            realm = "bank"

            [[security.users]]
            username = "teller"
            password = "teller"
            roles = ["USER"]

            [[security.rules]]
            method = "GET"
            path = "/accounts/**"
            roles = ["USER"]

            [[security.rules]]
            method = "GET"
            path = "/health"
            anonymous = true

            [store]
            first_id = 21

            [[seed]]
            number = "1234567890"
            name = "John Doe"

            [[seed.beneficiaries]]
            name = "Jane Doe"
            allocation = 0.25

            [[seed.beneficiaries]]
            name = "Junior Doe"
            allocation = "0.75"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.security.realm, "bank");
        assert_eq!(config.security.users.len(), 1);
        let rules = config.security.rules.as_deref().unwrap_or_default();
        assert_eq!(rules.len(), 2);
        assert!(!rules[0].anonymous);
        assert!(rules[1].anonymous && rules[1].roles.is_empty());
        assert_eq!(config.store.first_id, 21);

        let seed = &config.seed[0];
        assert_eq!(seed.beneficiaries.len(), 2);
        assert_eq!(seed.beneficiaries[0].allocation, "0.25".parse().unwrap());
        assert_eq!(seed.beneficiaries[1].allocation, "0.75".parse().unwrap());
    }
}
