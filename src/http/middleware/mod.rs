//! Per-route middleware.
//!
//! # Data Flow
//! ```text
//! Request
//!     → middleware[0] .. middleware[n] (in declaration order)
//!         Continue(req)  → next middleware / handler
//!         Respond(resp)  → answer immediately
//!         Err(RouteError) → error-propagation channel
//!     → bound handler
//! ```
//!
//! # Design Decisions
//! - Middleware values are opaque: the composer places them into chains
//!   verbatim and only the upload cache looks at a key (its size limit)
//! - A chain is a plain `Vec<Arc<dyn Middleware>>`, shared by every row
//!   that resolves to the same middleware instance

pub mod body;
pub mod cache;
pub mod composer;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::http::handler::RouteError;

pub use body::{FileUpload, JsonBody, ParsedBody, UploadedBody, UrlEncodedBody};
pub use cache::UploadMiddlewareCache;
pub use composer::MiddlewareComposer;

/// Shared handle to a middleware value.
pub type MiddlewareRef = Arc<dyn Middleware>;

/// Result of middleware processing.
pub enum MiddlewareResult {
    /// Continue to the next middleware/handler.
    Continue(Request<Body>),
    /// Stop processing and return this response.
    Respond(Response),
}

/// A step run before a route's handler.
pub trait Middleware: Send + Sync {
    /// Short label used in logs and diagnostics.
    fn name(&self) -> &str;

    fn handle(&self, req: Request<Body>) -> BoxFuture<'_, Result<MiddlewareResult, RouteError>>;
}

impl fmt::Debug for dyn Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Middleware({})", self.name())
    }
}

/// Middleware built from an async closure.
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<MiddlewareResult, RouteError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, req: Request<Body>) -> BoxFuture<'_, Result<MiddlewareResult, RouteError>> {
        Box::pin((self.f)(req))
    }
}

/// Wrap an async closure as a named middleware.
///
/// ```ignore
/// let auth = autoroute::http::middleware::from_fn("auth", |req| async move {
///     if req.headers().contains_key("authorization") {
///         Ok(MiddlewareResult::Continue(req))
///     } else {
///         Err(RouteError::new("unauthorized").with_status(401))
///     }
/// });
/// ```
pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> MiddlewareRef
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<MiddlewareResult, RouteError>> + Send + 'static,
{
    Arc::new(FnMiddleware {
        name: name.into(),
        f,
    })
}

/// Run a chain in order, stopping at the first response or error.
pub async fn run_chain(
    chain: &[MiddlewareRef],
    mut req: Request<Body>,
) -> Result<MiddlewareResult, RouteError> {
    for mw in chain {
        match mw.handle(req).await? {
            MiddlewareResult::Continue(next) => req = next,
            MiddlewareResult::Respond(resp) => {
                tracing::debug!(middleware = mw.name(), "Middleware answered request");
                return Ok(MiddlewareResult::Respond(resp));
            }
        }
    }
    Ok(MiddlewareResult::Continue(req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::IntoResponse;

    fn tag(name: &'static str) -> MiddlewareRef {
        from_fn(name, move |mut req: Request<Body>| async move {
            let seen = req
                .headers()
                .get("x-seen")
                .and_then(|v| v.to_str().ok())
                .map(|v| format!("{v},{name}"))
                .unwrap_or_else(|| name.to_string());
            req.headers_mut()
                .insert("x-seen", HeaderValue::from_str(&seen).unwrap());
            Ok(MiddlewareResult::Continue(req))
        })
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let chain = vec![tag("a"), tag("b"), tag("c")];
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        match run_chain(&chain, req).await.unwrap() {
            MiddlewareResult::Continue(req) => {
                assert_eq!(req.headers()["x-seen"], "a,b,c");
            }
            MiddlewareResult::Respond(_) => panic!("chain should continue"),
        }
    }

    #[tokio::test]
    async fn test_chain_stops_at_response() {
        let stop = from_fn("stop", |_req: Request<Body>| async move {
            Ok(MiddlewareResult::Respond(StatusCode::ACCEPTED.into_response()))
        });
        let after = from_fn("after", |_req: Request<Body>| async move {
            Err(RouteError::new("must not run"))
        });
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        match run_chain(&[stop, after], req).await.unwrap() {
            MiddlewareResult::Respond(resp) => assert_eq!(resp.status(), StatusCode::ACCEPTED),
            MiddlewareResult::Continue(_) => panic!("chain should stop"),
        }
    }

    #[tokio::test]
    async fn test_chain_forwards_error() {
        let fail = from_fn("fail", |_req: Request<Body>| async move {
            Err(RouteError::new("nope").with_status(401))
        });
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let err = match run_chain(&[tag("a"), fail], req).await {
            Err(err) => err,
            Ok(_) => panic!("chain should fail"),
        };
        assert_eq!(err.status(), Some(401));
    }
}
