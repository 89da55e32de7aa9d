//! Per-request middleware owned by the HTTP layer.
//!
//! Authentication and authorization live in `crate::security`.

pub mod observe;
pub mod request_metrics;

pub use observe::{observe_operation, ObservedOperation};
pub use request_metrics::track_requests;
