//! HTTP transport.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum router, timeout, trace, request id)
//!     → request.rs (assign x-request-id if missing)
//!     → DocumentGateway (resolve backend, perform one operation)
//!     → JSON response, or {"error": …} with a mapped status
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
