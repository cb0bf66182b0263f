//! # SmartCourses
//!
//! Backend for an online course marketplace:
//! - Accounts with Student, Instructor and Admin roles (JWT access tokens,
//!   rotating refresh tokens)
//! - Course catalogue with categories, skills, sections and lessons
//! - Enrollments with per-lesson progress and completion tracking
//! - Reviews, notifications and role dashboards
//! - Local file uploads and JSON seed data
//!
//! ## Architecture
//!
//! - **Domain Layer**: Entities, business rules and repository traits
//! - **Application Layer**: Services and DTOs
//! - **Infrastructure Layer**: PostgreSQL repositories, Redis cache, metrics, storage, seeding
//! - **Presentation Layer**: HTTP handlers, routes and middleware
//!
//! ## Module Structure
//!
//! ```text
//! smart_courses/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects and repository traits
//! +-- application/    Services and DTOs
//! +-- infrastructure/ Database, cache, storage and seeding
//! +-- presentation/   HTTP routes, handlers and middleware
//! +-- shared/         Errors, envelopes, pagination, validation
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
