//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures owned by the durable store. The cache
//! only ever holds projections of them.
//!
//! # Entity Types
//!
//! - [`UrlRecord`] - A short code → long URL mapping with optional expiry
//! - [`DedupEntry`] - Normalized URL digest → first minted short code
//! - [`UrlStats`] - Click count read model

pub mod dedup_entry;
pub mod url_record;
pub mod url_stats;

pub use dedup_entry::DedupEntry;
pub use url_record::UrlRecord;
pub use url_stats::UrlStats;
