//! Account and beneficiary service library.

// Core domain
pub mod domain;
pub mod manager;
pub mod store;

// Serving
pub mod config;
pub mod http;
pub mod security;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
