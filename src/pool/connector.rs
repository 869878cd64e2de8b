//! The connection factory seam between discovery and the pool.

use thiserror::Error;

/// Why a connector refused to produce a connection for an address.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The discovered address could not be parsed into a backend URL.
    #[error("invalid backend address {address}: {source}")]
    InvalidAddress {
        address: String,
        source: url::ParseError,
    },

    /// The underlying HTTP client could not be built or cloned.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Anything else; used by connectors that dial eagerly.
    #[error("{0}")]
    Other(String),
}

/// Builds one live connection per backend address.
///
/// The pool calls this once per address on every accepted membership event,
/// sequentially. Implementations must tolerate repeated calls for the same
/// address; a failure only excludes that address from the new list.
pub trait Connector: Send + Sync + 'static {
    type Conn: Send + Sync + 'static;

    fn connect(&self, address: &str) -> Result<Self::Conn, ConnectorError>;
}

/// Plain closures work as connectors, which keeps tests short.
impl<C, F> Connector for F
where
    F: Fn(&str) -> Result<C, ConnectorError> + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    type Conn = C;

    fn connect(&self, address: &str) -> Result<C, ConnectorError> {
        self(address)
    }
}
