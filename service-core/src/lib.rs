//! service-core: shared HTTP plumbing for the OTP authentication service.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use tracing;
