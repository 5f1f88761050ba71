//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AutorouteConfig (validated, immutable)
//!     → consumed once at the start of the startup pipeline
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; route tables are built from it exactly once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AutorouteConfig;
pub use schema::BodyConfig;
pub use schema::DiscoveryConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::RootConfig;
pub use schema::RoutingOptions;
pub use schema::UploadConfig;
pub use schema::VerbDefault;
