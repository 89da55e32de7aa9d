//! Request counting and latency.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_request;

pub async fn track_requests(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();

    let response = next.run(req).await;
    record_request(&method, response.status().as_u16(), start);
    response
}
