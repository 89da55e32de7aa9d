//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → consumed once at startup to build the server
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → pushed over a channel to the running server
//!     → server swaps in the new user registry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the user registry is hot-reloaded; everything else needs a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, RuleConfig, SecurityConfig, SeedAccount,
    SeedBeneficiary, ServiceConfig, StoreConfig, TimeoutConfig, UserConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
