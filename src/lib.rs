//! Document gateway over a dynamically discovered CouchDB cluster.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────┐
//!                    │                COUCH GATEWAY                   │
//!                    │                                                │
//!   Client Request   │  ┌────────┐   ┌─────────┐   ┌──────────────┐  │
//!   ─────────────────┼─▶│  http  │──▶│ service │──▶│     pool     │  │
//!                    │  │ server │   │ gateway │   │ (round robin)│  │
//!                    │  └────────┘   └─────────┘   └──────┬───────┘  │
//!                    │                                    │          │
//!                    │                                    ▼          │
//!                    │  ┌───────────┐   events   ┌──────────────┐    │      CouchDB
//!   Consul catalog ──┼─▶│ discovery │───────────▶│    store     │────┼───▶  instances
//!                    │  │  watcher  │            │ (+ metrics)  │    │
//!                    │  └───────────┘            └──────────────┘    │
//!                    │                                                │
//!                    │  config · observability · lifecycle · resilience
//!                    └────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod discovery;
pub mod http;
pub mod pool;
pub mod service;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pool::RoundRobinPool;
