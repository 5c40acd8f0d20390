//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the pix service.

mod auth;
mod handlers;
mod rate_limit;
mod server;

pub use auth::AuthenticatedUser;
pub use handlers::{ApiError, AppState};
pub use rate_limit::RateLimiterState;
pub use server::HttpServer;
