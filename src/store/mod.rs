//! Document storage backends.
//!
//! # Data Flow
//! ```text
//! discovered address
//!     → couch.rs connector (address → database client)
//!     → instrument.rs decorator (count, latency, errors per call)
//!     → installed in the pool
//!
//! caller request
//!     → DocumentStore::fetch / create_with_generated_id
//!     → CouchDB HTTP API
//! ```
//!
//! # Design Decisions
//! - The trait exposes exactly the two operations the gateway performs;
//!   nothing else of the database API leaks through
//! - Backend errors propagate to the caller unchanged; the store never
//!   retries and never classifies transient vs. permanent failures

pub mod couch;
pub mod instrument;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored document, reduced to its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(rename = "_rev", default, skip_serializing_if = "String::is_empty")]
    pub rev: String,
}

/// A backend operation failure, surfaced to the caller as-is.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {id} not found")]
    NotFound { id: String },

    #[error("backend returned status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The capability the gateway needs from one backend connection.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Look up one document by id.
    async fn fetch(&self, id: &str) -> Result<Document, StoreError>;

    /// Insert a seed document under a freshly generated id.
    async fn create_with_generated_id(&self) -> Result<bool, StoreError>;
}
