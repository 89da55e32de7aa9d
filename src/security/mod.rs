//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (Basic credentials → Principal, 401 on failure)
//!     → policy.rs (first matching rule → Allow, else 403)
//!     → pattern.rs (path matching for each rule)
//!     → Pass to handlers with the Principal in request extensions
//! ```
//!
//! # Design Decisions
//! - Fail closed: no matching rule is a deny
//! - Authentication is checked before any rule is evaluated
//! - Credential backing is a trait; the in-memory registry is the default

pub mod access_control;
pub mod credentials;
pub mod pattern;
pub mod policy;

pub use access_control::{access_control_middleware, AccessControlState};
pub use credentials::{AuthenticationError, CredentialResolver, InMemoryCredentials, Principal};
pub use pattern::{PathPattern, PatternError};
pub use policy::{AuthorizationPolicy, AuthorizationRule, Decision, DenyReason, PolicyError, Role};
