//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, TraceLayer, graceful shutdown)
//!     → axum::Router built by dispatch.rs (one MethodRouter per path)
//!     → dispatch.rs (middleware chain → bound handler, panics caught)
//!     → errors.rs (user error handler → default JSON error, 404 fallback)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod errors;
pub mod handler;
pub mod middleware;
pub mod server;

pub use dispatch::{register, Dispatch};
pub use errors::ErrorChain;
pub use handler::{
    BoundHandler, ErrorHandler, HandlerFuture, RequestHandler, RequestHead, RouteError, X_REQUEST_ID,
};
pub use middleware::{from_fn, Middleware, MiddlewareRef, MiddlewareResult};
pub use server::HttpServer;
