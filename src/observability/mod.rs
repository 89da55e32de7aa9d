//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Named operation (route handler, store read)
//!     → intercept.rs (Interceptor looks up observers by operation key)
//!     → pre-hooks → call → post-hooks
//!     → logging.rs (LoggingObserver: one INFO event per call)
//!     → metrics.rs (MetricsObserver: one counter increment per call)
//! ```
//!
//! # Design Decisions
//! - Observation is advisory: the observed call's output is returned untouched
//! - Observer failures are logged and swallowed, never propagated
//! - Callers only know operation keys, never the observers attached to them

pub mod intercept;
pub mod logging;
pub mod metrics;

pub use intercept::{ops, Interceptor, Invocation, Observed, Observer, ObserverError, Outcome};
pub use logging::LoggingObserver;
pub use metrics::MetricsObserver;
