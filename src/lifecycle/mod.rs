//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Walk roots → Validate → Register → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → broadcast → stop accepting → drain in-flight requests → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the listener is bound only after registration succeeds
//! - A failed phase aborts startup; no partial route tree is ever served

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Phase, Pipeline};
