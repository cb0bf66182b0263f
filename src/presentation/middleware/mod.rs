//! Middleware
//!
//! Tower middleware for request processing.

pub mod auth;
pub mod cors;
pub mod logging;
pub mod rate_limit;
pub mod security;

pub use auth::{
    auth_middleware, optional_auth_middleware, require_admin, require_instructor, AuthUser,
};
pub use cors::create_cors_layer;
pub use logging::{create_trace_layer, metrics_middleware};
pub use rate_limit::{
    rate_limit_api, rate_limit_auth, EndpointClass, RateLimitConfig, RateLimitInfo, RateLimiter,
};
pub use security::{create_security_headers_layer, SecurityHeadersConfig, SecurityHeadersLayer};
