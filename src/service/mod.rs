//! The document service.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → DocumentGateway (one pool.next() per request)
//!     → DocumentStore operation (exactly one per request)
//!     → result or GatewayError back to the transport
//! ```
//!
//! # Design Decisions
//! - Connections are re-resolved on every request, never cached, so rotation
//!   and membership changes take effect on the next request
//! - Only two error kinds cross this boundary: the pool being empty
//!   (retryable) and the backend operation failing

use std::sync::Arc;

use thiserror::Error;

use crate::pool::{NoBackends, RoundRobinPool};
use crate::store::{Document, DocumentStore, StoreError};

/// The public error surface of the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Pool(#[from] NoBackends),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Serves document operations against whichever backend the pool hands out.
pub struct DocumentGateway<C> {
    pool: Arc<RoundRobinPool<C>>,
}

impl<C: DocumentStore> DocumentGateway<C> {
    pub fn new(pool: Arc<RoundRobinPool<C>>) -> Self {
        Self { pool }
    }

    /// Liveness probe. Deliberately independent of pool state: an empty pool
    /// means degraded, not dead, and the process should keep receiving
    /// traffic so it can answer again once membership recovers.
    pub fn check(&self) -> bool {
        true
    }

    pub async fn get_document(&self, id: &str) -> Result<Document, GatewayError> {
        let store = self.pool.next()?;
        Ok(store.fetch(id).await?)
    }

    pub async fn put_document(&self) -> Result<bool, GatewayError> {
        let store = self.pool.next()?;
        Ok(store.create_with_generated_id().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::MembershipEvent;
    use crate::pool::ConnectorError;
    use async_trait::async_trait;

    struct StaticStore {
        address: String,
    }

    #[async_trait]
    impl DocumentStore for StaticStore {
        async fn fetch(&self, id: &str) -> Result<Document, StoreError> {
            Ok(Document {
                id: id.to_string(),
                rev: format!("1-{}", self.address),
            })
        }

        async fn create_with_generated_id(&self) -> Result<bool, StoreError> {
            Ok(true)
        }
    }

    fn connect(address: &str) -> Result<StaticStore, ConnectorError> {
        Ok(StaticStore {
            address: address.to_string(),
        })
    }

    #[tokio::test]
    async fn each_request_resolves_the_next_backend() {
        let pool = RoundRobinPool::new();
        pool.apply(
            MembershipEvent::instances(vec!["a:5984".into(), "b:5984".into()]),
            &connect,
        );
        let gateway = DocumentGateway::new(pool);

        let first = gateway.get_document("doc").await.unwrap();
        let second = gateway.get_document("doc").await.unwrap();
        assert_ne!(first.rev, second.rev, "successive requests rotate");
    }

    #[tokio::test]
    async fn empty_pool_surfaces_as_a_pool_error() {
        let pool: Arc<RoundRobinPool<StaticStore>> = RoundRobinPool::new();
        let gateway = DocumentGateway::new(pool);

        let error = gateway.get_document("doc").await.unwrap_err();
        assert!(matches!(error, GatewayError::Pool(NoBackends)));
        assert_eq!(error.to_string(), "no databases available");
    }

    #[tokio::test]
    async fn check_ignores_pool_state() {
        let pool: Arc<RoundRobinPool<StaticStore>> = RoundRobinPool::new();
        let gateway = DocumentGateway::new(pool);
        assert!(gateway.check());
    }
}
