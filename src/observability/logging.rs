//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from configuration
//! - Provide the logging observer for intercepted operations
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::observability::intercept::{Invocation, Observer, ObserverError, Outcome};

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("account_service={0},tower_http={0}", config.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {e}");
    }
}

/// Emits one INFO event before each observed call, and a DEBUG event with
/// the outcome and latency after it.
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    name: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self::named(std::any::type_name::<Self>())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for LoggingObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn before(&self, invocation: &Invocation<'_>) -> Result<(), ObserverError> {
        tracing::info!(
            observer = %self.name,
            operation = invocation.operation(),
            "Executing before {}",
            invocation.operation()
        );
        Ok(())
    }

    fn after(&self, invocation: &Invocation<'_>, outcome: Outcome) -> Result<(), ObserverError> {
        tracing::debug!(
            observer = %self.name,
            operation = invocation.operation(),
            ?outcome,
            elapsed_us = invocation.elapsed().as_micros() as u64,
            "Completed {}",
            invocation.operation()
        );
        Ok(())
    }
}
