//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, timeouts and log level
//! - Check users, rules and seed accounts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{ServiceConfig, UserConfig};
use crate::domain::Account;
use crate::security::AuthorizationRule;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    validate_users(&config.security.users, &mut errors);

    if let Some(rules) = &config.security.rules {
        for (i, rule) in rules.iter().enumerate() {
            if let Err(e) = AuthorizationRule::from_config(rule) {
                errors.push(ValidationError::new(format!("security.rules[{i}]"), e.to_string()));
            }
            if rule.anonymous && !rule.roles.is_empty() {
                errors.push(ValidationError::new(
                    format!("security.rules[{i}]"),
                    "an anonymous rule takes no roles",
                ));
            }
        }
    }

    validate_seed(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_users(users: &[UserConfig], errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for (i, user) in users.iter().enumerate() {
        let field = format!("security.users[{i}]");

        if user.username.trim().is_empty() {
            errors.push(ValidationError::new(&field, "username must not be empty"));
        } else if !seen.insert(user.username.as_str()) {
            errors.push(ValidationError::new(&field, format!("duplicate username '{}'", user.username)));
        }

        match (&user.password, &user.password_sha256) {
            (Some(_), Some(_)) => errors.push(ValidationError::new(
                &field,
                "set either password or password_sha256, not both",
            )),
            (None, None) => errors.push(ValidationError::new(&field, "no password configured")),
            (None, Some(digest)) => {
                let valid = digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit());
                if !valid {
                    errors.push(ValidationError::new(&field, "password_sha256 must be 64 hex characters"));
                }
            }
            (Some(_), None) => {}
        }

        if user.roles.iter().all(|r| r.trim().is_empty()) {
            errors.push(ValidationError::new(&field, "at least one role is required"));
        }
    }
}

fn validate_seed(config: &ServiceConfig, errors: &mut Vec<ValidationError>) {
    let mut numbers = HashSet::new();
    for (i, seed) in config.seed.iter().enumerate() {
        let field = format!("seed[{i}]");

        if seed.number.trim().is_empty() || seed.name.trim().is_empty() {
            errors.push(ValidationError::new(&field, "number and name must not be empty"));
        }
        if !numbers.insert(seed.number.as_str()) {
            errors.push(ValidationError::new(&field, format!("duplicate account number '{}'", seed.number)));
        }

        // Replay the beneficiaries through the domain rules.
        let mut account = Account::new(seed.number.clone(), seed.name.clone());
        for b in &seed.beneficiaries {
            if let Err(e) = account.add_beneficiary(b.name.clone(), b.allocation) {
                errors.push(ValidationError::new(&field, e.to_string()));
            }
        }
    }
}
