//! # Domain Layer
//!
//! The domain layer contains the core business rules of the course marketplace.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities (User, Course, Enrollment, Review, etc.)
//! - **value_objects**: Small shared value types (Role, AuditInfo)
//! - **services**: Pure rules spanning entities (progress math, publish gate)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - Entities encapsulate domain behavior

pub mod entities;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;
