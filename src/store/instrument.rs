//! Metrics decorator for document stores.

use std::time::Instant;

use async_trait::async_trait;

use crate::observability::metrics;
use crate::pool::{Connector, ConnectorError};
use crate::store::{Document, DocumentStore, StoreError};

/// Wraps a store and records one request count, one latency observation, and
/// on failure one error count per call, labeled by operation name.
///
/// Recording goes through the `metrics` macros and cannot fail, so the
/// wrapped operation's result is always returned untouched.
pub struct Instrumented<S> {
    inner: S,
}

impl<S> Instrumented<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for Instrumented<S> {
    async fn fetch(&self, id: &str) -> Result<Document, StoreError> {
        let start = Instant::now();
        let result = self.inner.fetch(id).await;
        metrics::record_store_call("fetch", start.elapsed(), result.is_err());
        result
    }

    async fn create_with_generated_id(&self) -> Result<bool, StoreError> {
        let start = Instant::now();
        let result = self.inner.create_with_generated_id().await;
        metrics::record_store_call("create", start.elapsed(), result.is_err());
        result
    }
}

/// Decorates every connection a connector produces, so each backend installed
/// by a membership update reports metrics from its first call on.
pub struct InstrumentedConnector<K>(pub K);

impl<K> Connector for InstrumentedConnector<K>
where
    K: Connector,
    K::Conn: DocumentStore,
{
    type Conn = Instrumented<K::Conn>;

    fn connect(&self, address: &str) -> Result<Self::Conn, ConnectorError> {
        Ok(Instrumented::new(self.0.connect(address)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyStore;

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn fetch(&self, _id: &str) -> Result<Document, StoreError> {
            Err(StoreError::UnexpectedStatus { status: 500 })
        }

        async fn create_with_generated_id(&self) -> Result<bool, StoreError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn forwards_results_untouched() {
        let store = Instrumented::new(FlakyStore);

        let error = store.fetch("doc-1").await.unwrap_err();
        assert!(matches!(error, StoreError::UnexpectedStatus { status: 500 }));

        assert!(store.create_with_generated_id().await.unwrap());
    }
}
