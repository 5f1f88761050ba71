//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route unit (from discovery) + directory prefix
//!     → builder.rs (class prefix, handler path, verbs, middleware chain)
//!     → definition.rs (RouteDefinition rows collected in a RoutingTable)
//!     → conflict.rs (reject overlapping (path, verb) pairs)
//!     → handed to http::dispatch for registration
//! ```
//!
//! # Design Decisions
//! - Routes are resolved once at startup and immutable at runtime
//! - Paths are compared as exact byte strings
//! - Deterministic: the same tree always yields the same table and the same errors

pub mod builder;
pub mod conflict;
pub mod definition;
pub mod verb;

pub use builder::RouteBuilder;
pub use conflict::ConflictValidator;
pub use definition::{RouteDefinition, RouteSummary, RoutingTable};
pub use verb::Verb;
