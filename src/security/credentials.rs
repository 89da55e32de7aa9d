//! Credential resolution.
//!
//! # Responsibilities
//! - Turn a username/password pair into a `Principal`
//! - Hold the in-memory user registry, replaceable at runtime
//!
//! # Design Decisions
//! - Passwords are kept as SHA-256 digests of `username:password`
//! - Digests are compared without early exit
//! - The registry is swapped atomically on config reload

use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;

use crate::config::UserConfig;
use crate::security::policy::{roles, Role};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    username: String,
    roles: BTreeSet<Role>,
}

impl Principal {
    pub fn new(username: impl Into<String>, roles: BTreeSet<Role>) -> Self {
        Self {
            username: username.into(),
            roles,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains(&Role::new(name))
    }
}

/// Authentication failures. All of them end in 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    #[error("authentication required")]
    MissingCredentials,

    #[error("malformed Authorization header")]
    MalformedHeader,

    #[error("bad credentials")]
    BadCredentials,

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Resolves credentials to a principal.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthenticationError>;
}

#[derive(Debug, Clone)]
struct StoredUser {
    digest: Vec<u8>,
    roles: BTreeSet<Role>,
}

/// User registry held in memory.
#[derive(Debug)]
pub struct InMemoryCredentials {
    users: ArcSwap<HashMap<String, StoredUser>>,
}

impl InMemoryCredentials {
    pub fn new(users: &[UserConfig]) -> Self {
        Self {
            users: ArcSwap::from_pointee(build_registry(users)),
        }
    }

    /// Replace the whole registry.
    pub fn replace(&self, users: &[UserConfig]) {
        let registry = build_registry(users);
        tracing::info!(users = registry.len(), "Credential registry replaced");
        self.users.store(Arc::new(registry));
    }

    pub fn len(&self) -> usize {
        self.users.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialResolver for InMemoryCredentials {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthenticationError> {
        let users = self.users.load();
        let user = users.get(username).ok_or(AuthenticationError::BadCredentials)?;

        if !digests_equal(&user.digest, &password_digest(username, password)) {
            return Err(AuthenticationError::BadCredentials);
        }
        Ok(Principal::new(username, user.roles.clone()))
    }
}

/// SHA-256 of `username:password`, the form stored in the registry.
pub fn password_digest(username: &str, password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

fn digests_equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn build_registry(users: &[UserConfig]) -> HashMap<String, StoredUser> {
    let mut registry = HashMap::new();
    for user in users {
        let digest = match (&user.password, &user.password_sha256) {
            (_, Some(hex_digest)) => match hex::decode(hex_digest) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(username = %user.username, error = %e, "Skipping user with invalid password digest");
                    continue;
                }
            },
            (Some(password), None) => password_digest(&user.username, password),
            (None, None) => {
                tracing::warn!(username = %user.username, "Skipping user without a password");
                continue;
            }
        };

        registry.insert(
            user.username.clone(),
            StoredUser {
                digest,
                roles: roles(&user.roles),
            },
        );
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;

    fn default_registry() -> InMemoryCredentials {
        InMemoryCredentials::new(&SecurityConfig::default().users)
    }

    #[tokio::test]
    async fn test_default_users() {
        let credentials = default_registry();
        assert_eq!(credentials.len(), 3);

        let user = credentials.authenticate("user", "user").await.unwrap();
        assert!(user.has_role("USER"));
        assert!(!user.has_role("ADMIN"));

        let admin = credentials.authenticate("admin", "admin").await.unwrap();
        assert!(admin.has_role("user"));
        assert!(admin.has_role("admin"));

        let superadmin = credentials.authenticate("superadmin", "superadmin").await.unwrap();
        assert_eq!(superadmin.roles().len(), 3);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let credentials = default_registry();
        assert_eq!(
            credentials.authenticate("user", "wrong").await,
            Err(AuthenticationError::BadCredentials)
        );
        assert_eq!(
            credentials.authenticate("nobody", "user").await,
            Err(AuthenticationError::BadCredentials)
        );
    }

    #[tokio::test]
    async fn test_digest_configured_user() {
        let digest = hex::encode(password_digest("auditor", "s3cret"));
        let credentials = InMemoryCredentials::new(&[UserConfig {
            username: "auditor".into(),
            password: None,
            password_sha256: Some(digest),
            roles: vec!["user".into()],
        }]);

        let principal = credentials.authenticate("auditor", "s3cret").await.unwrap();
        assert_eq!(principal.username(), "auditor");
        assert!(credentials.authenticate("auditor", "auditor").await.is_err());
    }

    #[tokio::test]
    async fn test_replace_registry() {
        let credentials = default_registry();
        credentials.replace(&[UserConfig {
            username: "ops".into(),
            password: Some("ops".into()),
            password_sha256: None,
            roles: vec!["SUPERADMIN".into()],
        }]);

        assert_eq!(credentials.len(), 1);
        assert!(credentials.authenticate("user", "user").await.is_err());
        assert!(credentials.authenticate("ops", "ops").await.unwrap().has_role("superadmin"));
    }
}
