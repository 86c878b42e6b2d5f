//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and caching.
//!
//! # Modules
//!
//! - [`cache`] - Volatile cache facade over Redis (or nothing)
//! - [`persistence`] - PostgreSQL repository implementation

pub mod cache;
pub mod persistence;
