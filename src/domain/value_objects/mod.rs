//! Value Objects
//!
//! Immutable value types shared by the entities.

mod audit;
mod role;

pub use audit::AuditInfo;
pub use role::{parse_roles, Role};
