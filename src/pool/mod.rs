//! The rotating backend pool.
//!
//! # Data Flow
//! ```text
//! membership feed (full address snapshots or feed errors)
//!     → listener task (one per pool, events applied strictly in order)
//!     → connector (one connection per surviving address)
//!     → atomic snapshot swap (whole list or nothing)
//!
//! caller request
//!     → next() (cursor increment, modulo, index; never blocks)
//!     → Arc<connection>
//! ```
//!
//! # Design Decisions
//! - One writer (the listener task), many readers; readers load immutable
//!   snapshots and never block each other or the writer
//! - The rotation cursor is never reset on membership changes, so fairness
//!   is approximate right after a swap but rotation stays monotonic
//! - Feed errors and per-address connection failures degrade the pool;
//!   they are never surfaced to callers of `next()`

pub mod connector;
pub mod round_robin;

pub use connector::{Connector, ConnectorError};
pub use round_robin::{NoBackends, RoundRobinPool};
