//! Configuration management.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared with all subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; membership is the only runtime-dynamic
//!   state and it arrives via discovery, not the config file
//! - All fields have defaults, so a minimal config (or none) works
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiConfig, DatabaseConfig, DiscoveryConfig, GatewayConfig, ListenerConfig,
    ObservabilityConfig, TimeoutConfig,
};
