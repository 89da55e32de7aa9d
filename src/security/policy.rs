//! Role-based authorization policy.
//!
//! # Responsibilities
//! - Hold the ordered rule table
//! - Decide Allow/Deny for (method, path, roles)
//!
//! # Design Decisions
//! - First matching rule wins
//! - No matching rule means Deny, whatever roles the caller holds
//! - An anonymous rule admits every caller and is checked before authentication
//! - Evaluation is a pure function, independent of the transport

use axum::http::Method;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::RuleConfig;
use crate::security::pattern::{PathPattern, PatternError};

pub const USER: &str = "USER";
pub const ADMIN: &str = "ADMIN";
pub const SUPERADMIN: &str = "SUPERADMIN";

/// A role name, normalized to upper case without a `ROLE_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: &str) -> Self {
        let upper = name.trim().to_uppercase();
        let stripped = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        Self(stripped.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build a role set from names.
pub fn roles<I, S>(names: I) -> BTreeSet<Role>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|n| Role::new(n.as_ref())).collect()
}

/// Errors building a policy from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// One row of the rule table.
#[derive(Debug, Clone)]
pub struct AuthorizationRule {
    /// `None` matches any method.
    method: Option<Method>,
    pattern: PathPattern,
    /// Empty set denies every request the rule matches, unless anonymous.
    roles: BTreeSet<Role>,
    anonymous: bool,
}

impl AuthorizationRule {
    pub fn new(method: Option<Method>, pattern: PathPattern, roles: BTreeSet<Role>) -> Self {
        Self {
            method,
            pattern,
            roles,
            anonymous: false,
        }
    }

    /// A rule that admits every caller, authenticated or not.
    pub fn anonymous(method: Option<Method>, pattern: PathPattern) -> Self {
        Self {
            method,
            pattern,
            roles: BTreeSet::new(),
            anonymous: true,
        }
    }

    /// Build from a config entry. `*` or `ANY` as method matches every method.
    pub fn from_config(config: &RuleConfig) -> Result<Self, PolicyError> {
        let method = match config.method.trim().to_uppercase().as_str() {
            "*" | "ANY" => None,
            name => Some(
                Method::from_str(name).map_err(|_| PolicyError::InvalidMethod(config.method.clone()))?,
            ),
        };
        let pattern = PathPattern::parse(&config.path)?;
        if config.anonymous {
            return Ok(Self::anonymous(method, pattern));
        }
        Ok(Self::new(method, pattern, roles(&config.roles)))
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map_or(true, |m| m == method) && self.pattern.matches(path)
    }

    /// True if any of `granted` is required by this rule.
    pub fn permits(&self, granted: &BTreeSet<Role>) -> bool {
        self.anonymous || !self.roles.is_disjoint(granted)
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No rule matched the request.
    NoMatchingRule,
    /// The rule at this index matched, but the caller lacks its roles.
    InsufficientRole { rule: usize },
}

/// Terminal state of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow { rule: usize },
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }
}

/// Ordered rule table with default deny.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    rules: Vec<AuthorizationRule>,
}

impl AuthorizationPolicy {
    pub fn new(rules: Vec<AuthorizationRule>) -> Self {
        Self { rules }
    }

    /// Use the configured table, or the built-in one when none is configured.
    pub fn from_config(rules: Option<&[RuleConfig]>) -> Result<Self, PolicyError> {
        match rules {
            Some(configs) => Ok(Self::new(
                configs
                    .iter()
                    .map(AuthorizationRule::from_config)
                    .collect::<Result<_, _>>()?,
            )),
            None => Self::from_config(Some(&default_rules())),
        }
    }

    pub fn rules(&self) -> &[AuthorizationRule] {
        &self.rules
    }

    /// True when the rule deciding this request is anonymous, so no
    /// credentials are needed.
    pub fn admits_anonymous(&self, method: &Method, path: &str) -> bool {
        self.matching(method, path)
            .is_some_and(|index| self.rules[index].is_anonymous())
    }

    pub fn evaluate(&self, method: &Method, path: &str, granted: &BTreeSet<Role>) -> Decision {
        match self.matching(method, path) {
            Some(index) if self.rules[index].permits(granted) => Decision::Allow { rule: index },
            Some(index) => Decision::Deny(DenyReason::InsufficientRole { rule: index }),
            None => Decision::Deny(DenyReason::NoMatchingRule),
        }
    }

    fn matching(&self, method: &Method, path: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.matches(method, path))
    }
}

/// The built-in rule table, in evaluation order.
pub fn default_rules() -> Vec<RuleConfig> {
    let rule = |method: &str, path: &str, names: &[&str]| RuleConfig {
        method: method.to_string(),
        path: path.to_string(),
        roles: names.iter().map(|n| n.to_string()).collect(),
        anonymous: false,
    };

    vec![
        RuleConfig {
            anonymous: true,
            ..rule("GET", "/health", &[])
        },
        rule("DELETE", "/accounts/**", &[SUPERADMIN]),
        rule("POST", "/accounts/**", &[ADMIN, SUPERADMIN]),
        rule("PUT", "/accounts/**", &[ADMIN, SUPERADMIN]),
        rule("GET", "/accounts/**", &[USER, ADMIN, SUPERADMIN]),
        rule("GET", "/authorities", &[USER, ADMIN, SUPERADMIN]),
    ]
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        // An unusable table denies everything.
        Self::from_config(Some(&default_rules())).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Built-in authorization rules rejected");
            Self::new(Vec::new())
        })
    }
}
