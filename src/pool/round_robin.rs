//! Round-robin rotation over an atomically swappable connection list.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::discovery::{Instancer, MembershipEvent};
use crate::observability::metrics;
use crate::pool::connector::Connector;

/// Returned by [`RoundRobinPool::next`] when the connection list is empty.
///
/// A normal, retryable condition: the pool starts empty and may become empty
/// again whenever discovery reports no reachable backends.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no databases available")]
pub struct NoBackends;

/// A pool of live backend connections served in rotation.
///
/// Membership is owned by a single background listener task; `next()` may be
/// called from arbitrarily many tasks concurrently and never blocks beyond an
/// atomic pointer load.
pub struct RoundRobinPool<C> {
    /// Current connection list. Rebuilt wholesale on every accepted
    /// membership event; readers always observe a complete list.
    connections: ArcSwap<Vec<Arc<C>>>,

    /// Rotation cursor. Monotonic for the pool's whole lifetime; it is not
    /// reset when the list changes.
    cursor: AtomicU64,
}

impl<C: Send + Sync + 'static> RoundRobinPool<C> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            connections: ArcSwap::from_pointee(Vec::new()),
            cursor: AtomicU64::new(0),
        })
    }

    /// Create the pool and start its membership listener.
    ///
    /// Registers a subscriber channel with `instancer` and spawns the one
    /// task allowed to replace the connection list. Returns immediately with
    /// an empty pool; `next()` fails with [`NoBackends`] until the first
    /// usable event arrives. The returned handle completes once the listener
    /// observes the shutdown signal or the feed closes.
    pub fn spawn<K>(
        instancer: &dyn Instancer,
        connector: K,
        shutdown: broadcast::Receiver<()>,
    ) -> (Arc<Self>, JoinHandle<()>)
    where
        K: Connector<Conn = C>,
    {
        let pool = Self::new();
        let (tx, rx) = mpsc::unbounded_channel();
        instancer.register(tx);
        let listener = tokio::spawn(Self::listen(pool.clone(), rx, connector, shutdown));
        (pool, listener)
    }

    async fn listen<K>(
        pool: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<MembershipEvent>,
        connector: K,
        mut shutdown: broadcast::Receiver<()>,
    ) where
        K: Connector<Conn = C>,
    {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => pool.apply(event, &connector),
                    None => {
                        tracing::debug!("membership feed closed, pool listener exiting");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::debug!("pool listener received shutdown signal");
                    break;
                }
            }
        }
    }

    /// Apply one membership event. Invoked only from the listener task.
    ///
    /// Feed errors keep the current list. Otherwise the addresses are sorted
    /// into canonical order, connected one by one (failures skip only that
    /// address), and the resulting list is installed in one atomic swap.
    pub(crate) fn apply<K>(&self, event: MembershipEvent, connector: &K)
    where
        K: Connector<Conn = C>,
    {
        if let Some(error) = event.error {
            tracing::warn!(error = %error, "discovery feed error, keeping current backends");
            return;
        }

        let mut addresses = event.instances;
        addresses.sort();

        let mut connections = Vec::with_capacity(addresses.len());
        for address in &addresses {
            match connector.connect(address) {
                Ok(connection) => connections.push(Arc::new(connection)),
                Err(error) => {
                    tracing::warn!(address = %address, error = %error, "skipping backend");
                }
            }
        }

        tracing::info!(
            backends = connections.len(),
            discovered = addresses.len(),
            "backend list replaced"
        );
        metrics::record_pool_size(connections.len());
        self.connections.store(Arc::new(connections));
    }

    /// Hand out the next connection in rotation.
    ///
    /// The length used for the modulo and the indexed element come from the
    /// same loaded snapshot, so a concurrent swap can never produce an
    /// out-of-range read.
    pub fn next(&self) -> Result<Arc<C>, NoBackends> {
        let connections = self.connections.load();
        if connections.is_empty() {
            return Err(NoBackends);
        }
        let turn = self.cursor.fetch_add(1, Ordering::Relaxed);
        let index = (turn % connections.len() as u64) as usize;
        Ok(connections[index].clone())
    }

    /// Number of live connections in the current snapshot.
    pub fn len(&self) -> usize {
        self.connections.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveryError;
    use crate::pool::connector::ConnectorError;
    use std::collections::HashSet;

    #[derive(Debug, PartialEq)]
    struct Label(String);

    fn connect_all(address: &str) -> Result<Label, ConnectorError> {
        Ok(Label(address.to_string()))
    }

    fn event(addresses: &[&str]) -> MembershipEvent {
        MembershipEvent::instances(addresses.iter().map(|a| a.to_string()).collect())
    }

    #[test]
    fn rotates_in_order_without_repeats() {
        let pool = RoundRobinPool::new();
        pool.apply(event(&["a:1", "b:1", "c:1"]), &connect_all);

        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(pool.next().unwrap().0.clone());
        }
        let first_round: HashSet<&String> = seen[0..3].iter().collect();
        assert_eq!(first_round.len(), 3, "no repeats within one full cycle");
        assert_eq!(seen[0], seen[3]);
        assert_eq!(seen[1], seen[4]);
        assert_eq!(seen[2], seen[5]);
    }

    #[test]
    fn empty_pool_fails_with_no_backends() {
        let pool: Arc<RoundRobinPool<Label>> = RoundRobinPool::new();
        assert_eq!(pool.next().unwrap_err(), NoBackends);
    }

    #[test]
    fn feed_error_keeps_current_list() {
        let pool = RoundRobinPool::new();
        pool.apply(event(&["a:1"]), &connect_all);

        pool.apply(
            MembershipEvent::failure(DiscoveryError::Transport("connection refused".into())),
            &connect_all,
        );

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.next().unwrap().0, "a:1");
    }

    #[test]
    fn shrinking_to_empty_brings_back_no_backends() {
        let pool = RoundRobinPool::new();
        pool.apply(event(&["a:1", "b:1"]), &connect_all);
        assert!(pool.next().is_ok());

        pool.apply(event(&[]), &connect_all);
        assert_eq!(pool.next().unwrap_err(), NoBackends);
    }

    #[test]
    fn failing_addresses_are_skipped_and_order_is_canonical() {
        let connect = |address: &str| {
            if address.starts_with('b') {
                Err(ConnectorError::Other("dial failed".into()))
            } else {
                Ok(Label(address.to_string()))
            }
        };

        for input in [&["c:1", "b:1", "a:1"], &["a:1", "b:1", "c:1"]] {
            let pool = RoundRobinPool::new();
            pool.apply(event(input), &connect);
            assert_eq!(pool.len(), 2);
            assert_eq!(pool.next().unwrap().0, "a:1");
            assert_eq!(pool.next().unwrap().0, "c:1");
        }
    }

    #[test]
    fn cursor_is_not_reset_by_membership_changes() {
        let pool = RoundRobinPool::new();
        pool.apply(event(&["a:1", "b:1"]), &connect_all);
        for _ in 0..3 {
            pool.next().unwrap();
        }

        pool.apply(event(&["a:1", "b:1", "c:1"]), &connect_all);
        // Cursor sits at 3; against the new three-element list that lands on
        // index 0 rather than starting a fresh cycle.
        assert_eq!(pool.next().unwrap().0, "a:1");
        assert_eq!(pool.next().unwrap().0, "b:1");
    }

    #[test]
    fn two_backends_alternate_strictly() {
        let pool = RoundRobinPool::new();
        pool.apply(event(&["h1:5984", "h2:5984"]), &connect_all);

        let first = pool.next().unwrap().0.clone();
        let second = pool.next().unwrap().0.clone();
        assert_ne!(first, second);
        assert_eq!(pool.next().unwrap().0, first);
        assert_eq!(pool.next().unwrap().0, second);
    }
}
