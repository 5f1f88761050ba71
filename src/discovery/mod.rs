//! Route discovery.
//!
//! # Data Flow
//! ```text
//! root directory
//!     → walker.rs (sorted listing, files first, then subdirectories)
//!     → source.rs (RouteSource: filesystem + inventory registry, or memory)
//!     → module.rs (ModuleExport → RouteUnit per class / function / object)
//!     → metadata.rs (annotations extracted once, then dropped)
//!     → routing::RouteBuilder
//! ```

pub mod metadata;
pub mod module;
pub mod source;
pub mod walker;

pub use metadata::{Annotated, ClassMetadata, HandlerMetadata, UploadLimit};
pub use module::{ClassSpec, HandlerSpec, ModuleExport, ModuleLoader, RouteUnit, UnitShape};
pub use source::{FsSource, MemorySource, ModuleRegistration, ModuleRegistry, RouteSource};
pub use walker::RouteTreeWalker;
