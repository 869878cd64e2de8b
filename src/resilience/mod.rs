//! Resilience helpers.
//!
//! # Design Decisions
//! - Backoff applies only to the discovery watch loop; caller requests are
//!   never retried across backends, the pool just rotates on the next call

pub mod backoff;
