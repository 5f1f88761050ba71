//! Handler adaptation and registration into axum.
//!
//! # Responsibilities
//! - Run a row's middleware chain, then its bound handler
//! - Route every failure (returned `Err`, panic, middleware error) into the
//!   error chain instead of the transport
//! - Group rows by path into axum method routers
//!
//! # Design Decisions
//! - Error-kind rows receive errors raised by their own middleware chain;
//!   a clean chain means there is nothing for them to handle, so the request
//!   is forwarded as not found
//! - Paths are registered once per distinct path string; conflicts are
//!   rejected before registration, so an `all` row is alone at its path

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::response::Response;
use axum::routing::{any, MethodRouter};
use axum::Router;
use futures_util::FutureExt;

use crate::http::errors::{tag_request_id, ErrorChain};
use crate::http::handler::{BoundHandler, RequestHead, RouteError, X_REQUEST_ID};
use crate::http::middleware::{run_chain, MiddlewareRef, MiddlewareResult};
use crate::observability::metrics;
use crate::routing::{RouteDefinition, RoutingTable, Verb};

/// One adapted route row, ready to serve.
#[derive(Clone)]
pub struct Dispatch {
    middleware: Arc<[MiddlewareRef]>,
    handler: BoundHandler,
    errors: Arc<ErrorChain>,
}

impl Dispatch {
    pub fn adapt(route: &RouteDefinition, errors: Arc<ErrorChain>) -> Self {
        Self {
            middleware: route.middleware().into(),
            handler: route.handler().clone(),
            errors,
        }
    }

    /// Serve one request. Always produces a response.
    pub async fn call(self, mut req: Request<Body>) -> Response {
        let head = RequestHead::from_request(&req);
        if !req.headers().contains_key(X_REQUEST_ID) {
            if let Ok(value) = HeaderValue::from_str(&head.request_id) {
                req.headers_mut().insert(X_REQUEST_ID, value);
            }
        }

        let outcome = AssertUnwindSafe(self.run(req, &head))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                tracing::error!(request_id = %head.request_id, "Handler panicked");
                Err(RouteError::from_panic(panic))
            });

        match outcome {
            Ok(response) => tag_request_id(response, &head),
            Err(err) => self.errors.handle(err, head).await,
        }
    }

    async fn run(&self, req: Request<Body>, head: &RequestHead) -> Result<Response, RouteError> {
        match &self.handler {
            BoundHandler::Request(handler) => match run_chain(&self.middleware, req).await? {
                MiddlewareResult::Respond(response) => Ok(response),
                MiddlewareResult::Continue(req) => handler.call(req).await,
            },
            BoundHandler::Error(handler) => match run_chain(&self.middleware, req).await {
                Ok(MiddlewareResult::Respond(response)) => Ok(response),
                Ok(MiddlewareResult::Continue(req)) => {
                    Err(RouteError::not_found(req.method(), req.uri().path()))
                }
                Err(err) => handler.call(err, head.clone()).await,
            },
        }
    }
}

/// Register every row of `table` on a fresh router, with the not-found
/// fallback routed through `errors`.
pub fn register(table: RoutingTable, errors: Arc<ErrorChain>) -> Router {
    let total = table.len();
    let mut by_path: BTreeMap<String, Vec<(Verb, Dispatch)>> = BTreeMap::new();
    for route in table.into_routes() {
        let dispatch = Dispatch::adapt(&route, errors.clone());
        by_path
            .entry(to_axum_path(route.route_path()))
            .or_default()
            .push((route.verb(), dispatch));
    }

    let mut router = Router::new();
    for (path, rows) in by_path {
        tracing::trace!(path = %path, verbs = rows.len(), "Registering path");
        router = router.route(&path, method_router(rows, &errors));
    }

    let fallback = errors.clone();
    router = router.fallback(move |req: Request<Body>| async move { fallback.not_found(req).await });

    metrics::record_routes_registered(total);
    tracing::debug!(routes = total, "Routes registered");
    router
}

fn method_router(rows: Vec<(Verb, Dispatch)>, errors: &Arc<ErrorChain>) -> MethodRouter {
    if let Some((_, dispatch)) = rows.iter().find(|(verb, _)| *verb == Verb::All) {
        let dispatch = dispatch.clone();
        return any(move |req: Request<Body>| dispatch.call(req));
    }

    let mut method_router = MethodRouter::new();
    for (verb, dispatch) in rows {
        if let Some(filter) = verb.method_filter() {
            method_router = method_router.on(filter, move |req: Request<Body>| dispatch.call(req));
        }
    }
    // Unclaimed verbs at a known path are answered like unknown paths.
    let fallback = errors.clone();
    method_router.fallback(move |req: Request<Body>| async move { fallback.not_found(req).await })
}

/// Rewrite `:param` and `*` segments into axum's `{param}` and `{*rest}`
/// forms. Literal braces are escaped. Paths are expected to have passed
/// `check_path` when their row was built.
pub fn to_axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':').filter(|n| !n.is_empty()) {
                format!("{{{}}}", name)
            } else if segment == "*" {
                "{*wildcard}".to_string()
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{}}}", name)
            } else {
                segment.replace('{', "{{").replace('}', "}}")
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_axum_path() {
        assert_eq!(to_axum_path("/"), "/");
        assert_eq!(to_axum_path("/api/sales"), "/api/sales");
        assert_eq!(to_axum_path("/api/sales/:id"), "/api/sales/{id}");
        assert_eq!(to_axum_path("/files/*"), "/files/{*wildcard}");
        assert_eq!(to_axum_path("/files/*rest"), "/files/{*rest}");
        assert_eq!(to_axum_path("/a/{b}"), "/a/{{b}}");
    }
}
