//! Domain layer containing business entities and logic.
//!
//! Defines entities, the durable store contract, and the click accounting
//! pipeline independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - Click event model and non-blocking dispatcher
//! - [`click_worker`] - Asynchronous click processing worker
//!
//! # Click Processing Flow
//!
//! 1. The resolve path calls [`click_event::ClickDispatcher::dispatch`]
//! 2. The event is queued on a bounded channel (never awaited by the caller)
//! 3. [`click_worker::run_click_worker`] applies each increment once
//! 4. The counter is persisted via [`repositories::UrlRepository`]

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
