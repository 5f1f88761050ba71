//! File-system route discovery for axum.
//!
//! Route modules live in a directory tree. Each file exports a class-like
//! handler set, a lone function or a plain set of handlers, annotated with
//! route metadata. At startup the tree is walked, every handler is resolved
//! to `(path, verb)` rows, the rows are checked for conflicts, and the result
//! is registered on an `axum::Router`.
//!
//! ```ignore
//! // src/routes/api/sales.rs
//! use autoroute::prelude::*;
//!
//! fn routes() -> ModuleExport {
//!     ModuleExport::Class(
//!         ClassSpec::new("Sales")
//!             .method(HandlerSpec::new("list", BoundHandler::sync(|_req| Ok::<_, RouteError>("[]"))))
//!             .method(
//!                 HandlerSpec::new("create", BoundHandler::sync(|_req| Ok::<_, RouteError>("ok")))
//!                     .meta(HandlerMetadata::new().name("index").post()),
//!             ),
//!     )
//! }
//!
//! autoroute::route_module!(routes);
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

#[doc(hidden)]
pub use inventory;

pub use config::AutorouteConfig;
pub use error::{SetupError, StartupError};
pub use http::HttpServer;
pub use lifecycle::{Pipeline, Shutdown};

/// Everything a route module usually needs.
pub mod prelude {
    pub use crate::discovery::{ClassMetadata, ClassSpec, HandlerMetadata, HandlerSpec, ModuleExport};
    pub use crate::http::middleware::{from_fn, MiddlewareResult, ParsedBody, UploadedBody};
    pub use crate::http::{BoundHandler, RequestHead, RouteError};
}

/// Register the calling file as a route module.
///
/// `$factory` is a `fn() -> ModuleExport`. The registration is keyed by the
/// calling file's path, which discovery matches against the walked file.
#[macro_export]
macro_rules! route_module {
    ($factory:expr) => {
        $crate::inventory::submit! {
            $crate::discovery::source::ModuleRegistration::new(file!(), $factory)
        }
    };
}
