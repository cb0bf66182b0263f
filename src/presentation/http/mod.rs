//! HTTP API
//!
//! Routes, handlers, extractors and the per-request service wiring.

pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
