//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, outer layers)
//!     → request.rs (request ID, trace span)
//!     → security::access_control (401 / 403)
//!     → middleware/observe.rs (observers for the route's operation)
//!     → handlers.rs (manager call, response shaping)
//!     → error.rs (ApiError → status + JSON body)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - `/health` is merged outside the secured router
//! - Unknown paths fall back inside the secured router, so they are denied first

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
