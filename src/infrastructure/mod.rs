//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database pool, migrations and transaction helpers (PostgreSQL)
//! - Repository implementations
//! - Cache and rate-limit backing store (Redis)
//! - Prometheus metrics
//! - Local file storage for uploads
//! - JSON seeding at startup

pub mod cache;
pub mod database;
pub mod metrics;
pub mod repositories;
pub mod seeder;
pub mod storage;
