//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! ctrl-c / server exit
//!     → Shutdown::trigger (broadcast to all subscribers)
//!     → HTTP server drains, pool listener and consul watcher exit
//!     → main joins the background tasks and returns
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
