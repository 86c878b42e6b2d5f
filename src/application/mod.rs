//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! cache projections and business rules. Handlers call into it; it never
//! touches HTTP types.
//!
//! # Modules
//!
//! - [`services::url_service::UrlService`] - Create, resolve and stats paths
//! - [`rate_limit`] - Sliding-window rate limiters and category table

pub mod rate_limit;
pub mod services;
