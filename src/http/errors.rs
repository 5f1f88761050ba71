//! Request-time error channel.
//!
//! # Data Flow
//! ```text
//! RouteError (handler Err, panic, middleware Err, not found)
//!     → user error handler (optional)
//!         Ok(resp)  → sent
//!         Err(err)  → forwarded
//!     → default handler (JSON body, status from the error or 500)
//! ```
//!
//! # Design Decisions
//! - The chain always produces a response; nothing reaches the transport
//!   as an unhandled error
//! - Only the default handler logs and counts errors

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::FutureExt;
use serde_json::json;

use crate::http::handler::{ErrorHandler, RequestHead, RouteError, X_REQUEST_ID};
use crate::observability::metrics;

/// User error handler (if any) followed by the built-in default.
#[derive(Clone, Default)]
pub struct ErrorChain {
    user: Option<Arc<dyn ErrorHandler>>,
}

impl ErrorChain {
    /// A chain with only the built-in default handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain that tries `handler` before the default.
    pub fn with_handler(handler: Arc<dyn ErrorHandler>) -> Self {
        Self { user: Some(handler) }
    }

    pub fn has_user_handler(&self) -> bool {
        self.user.is_some()
    }

    /// Turn `err` into a response.
    pub async fn handle(&self, err: RouteError, head: RequestHead) -> Response {
        let err = match &self.user {
            Some(handler) => {
                let attempt = AssertUnwindSafe(async { handler.call(err, head.clone()).await })
                    .catch_unwind()
                    .await;
                match attempt {
                    Ok(Ok(response)) => return tag_request_id(response, &head),
                    Ok(Err(forwarded)) => forwarded,
                    Err(panic) => RouteError::from_panic(panic),
                }
            }
            None => err,
        };
        default_response(&err, &head)
    }

    /// Answer a request no route matched.
    pub async fn not_found(&self, req: Request<Body>) -> Response {
        let head = RequestHead::from_request(&req);
        metrics::record_not_found();
        tracing::debug!(
            request_id = %head.request_id,
            method = %head.method,
            path = %head.path(),
            "No route matched"
        );
        let err = RouteError::not_found(&head.method, head.path());
        self.handle(err, head).await
    }
}

/// The built-in default handler.
pub fn default_response(err: &RouteError, head: &RequestHead) -> Response {
    let status = err.response_status();
    if status.is_server_error() {
        tracing::error!(
            request_id = %head.request_id,
            method = %head.method,
            path = %head.path(),
            status = status.as_u16(),
            error = %err,
            "Request failed"
        );
    } else if status != StatusCode::NOT_FOUND {
        tracing::warn!(
            request_id = %head.request_id,
            method = %head.method,
            path = %head.path(),
            status = status.as_u16(),
            error = %err,
            "Request rejected"
        );
    }
    metrics::record_request_error(status.as_u16());

    let body = json!({
        "error": err.message(),
        "status": status.as_u16(),
    });
    tag_request_id((status, Json(body)).into_response(), head)
}

/// Echo the request ID on the response.
pub(crate) fn tag_request_id(mut response: Response, head: &RequestHead) -> Response {
    if let Ok(value) = HeaderValue::from_str(&head.request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
