//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! tracing and per-route rate limiting.

pub mod rate_limit;
pub mod trace;

pub use rate_limit::{Budget, RateLimit, RateLimits};
pub use trace::Trace;
