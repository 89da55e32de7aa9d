//! Route-level interception.
//! Wraps a handler so the observers keyed by its operation run around it.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

use crate::observability::Interceptor;

/// The operation key a route is observed under.
#[derive(Clone)]
pub struct ObservedOperation {
    pub interceptor: Arc<Interceptor>,
    pub operation: &'static str,
}

impl ObservedOperation {
    pub fn new(interceptor: Arc<Interceptor>, operation: &'static str) -> Self {
        Self {
            interceptor,
            operation,
        }
    }
}

pub async fn observe_operation(
    State(observed): State<ObservedOperation>,
    req: Request<Body>,
    next: Next,
) -> Response {
    observed
        .interceptor
        .observe(observed.operation, next.run(req))
        .await
}
