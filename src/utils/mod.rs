//! Utility functions for code generation, URL processing, and request handling.
//!
//! - [`code_generator`] - Short code generation and alias validation
//! - [`url_normalizer`] - URL sanitization and normalization for deduplication
//! - [`url_safety`] - Blocklist screening of submitted URLs
//! - [`client_ip`] - Client identity for rate limiting

pub mod client_ip;
pub mod code_generator;
pub mod url_normalizer;
pub mod url_safety;
