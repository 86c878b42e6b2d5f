//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx with bind
//! parameters. Schema lives in `migrations/` and is applied at startup.
//!
//! # Repositories
//!
//! - [`PgUrlRepository`] - URL records, dedup index and click counters

pub mod pg_url_repository;

pub use pg_url_repository::PgUrlRepository;
