//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Setup phases and request handling produce:
//!     → logging.rs (structured `tracing` events, pretty or JSON)
//!     → metrics.rs (routes registered, request errors, not-found hits)
//!
//! Consumers:
//!     → stdout / log aggregation
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the `x-request-id` header into every error log
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
