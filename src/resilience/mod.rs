//! Resilience helpers.
//!
//! # Design Decisions
//! - Only database bootstrap retries; request handling never retries

pub mod backoff;

pub use backoff::BackoffPolicy;
