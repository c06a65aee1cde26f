//! Cross-cutting HTTP middleware
//!
//! The access gate lives in [`crate::auth::middleware`].
//!
//! Author: hephaex@gmail.com

pub mod metrics;
pub mod security_headers;

pub use metrics::metrics_middleware;
pub use security_headers::security_headers_middleware;
