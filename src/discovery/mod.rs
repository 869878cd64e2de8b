//! Backend membership discovery.
//!
//! # Data Flow
//! ```text
//! Consul blocking query (or a static list)
//!     → watcher task (one per instancer)
//!     → MembershipEvent broadcast to every registered subscriber
//!     → pool listener (applies the snapshot)
//! ```
//!
//! # Design Decisions
//! - Events carry full snapshots, never deltas; the pool rebuilds wholesale
//! - A feed failure is an event too, so consumers can observe it, but it
//!   carries no addresses and must not be treated as "zero backends"
//! - New subscribers receive the cached last event immediately, so consumers
//!   constructed after the first poll still converge

pub mod consul;
pub mod fixed;

use thiserror::Error;
use tokio::sync::mpsc;

/// A discovery-feed failure. Recovered locally by consumers: the previous
/// membership is kept and the feed keeps polling.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    #[error("discovery request failed: {0}")]
    Transport(String),

    #[error("discovery response malformed: {0}")]
    Decode(String),
}

/// One discovery-feed message: either the full set of currently known
/// backend addresses, or a feed-level error.
#[derive(Debug, Clone, Default)]
pub struct MembershipEvent {
    /// Full snapshot of known addresses. Meaningless when `error` is set.
    pub instances: Vec<String>,

    /// Set when the feed itself failed; `instances` must then be ignored.
    pub error: Option<DiscoveryError>,
}

impl MembershipEvent {
    pub fn instances(instances: Vec<String>) -> Self {
        Self {
            instances,
            error: None,
        }
    }

    pub fn failure(error: DiscoveryError) -> Self {
        Self {
            instances: Vec::new(),
            error: Some(error),
        }
    }
}

/// A membership source the pool can subscribe to.
pub trait Instancer: Send + Sync {
    /// Register a subscriber. Implementations deliver the cached last event
    /// first (if one exists), then every subsequent event in arrival order.
    fn register(&self, subscriber: mpsc::UnboundedSender<MembershipEvent>);
}
