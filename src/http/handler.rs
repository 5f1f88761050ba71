//! Handler interfaces and the request-time error value.
//!
//! # Responsibilities
//! - Define the two handler shapes: regular request handlers and error handlers
//! - Adapt synchronous and asynchronous closures to one future-returning form
//! - Carry forwarded failures as `RouteError`
//!
//! # Design Decisions
//! - Regular and error handlers are distinct traits; registration picks the
//!   dispatch path from the variant, never from parameter counts
//! - `RouteError` is not itself a `std::error::Error`, which lets any error
//!   type convert into it through `?`

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use uuid::Uuid;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// What every adapted handler produces.
pub type HandlerFuture = BoxFuture<'static, Result<Response, RouteError>>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure forwarded into the error-propagation channel.
pub struct RouteError {
    message: String,
    status: Option<u16>,
    source: Option<BoxError>,
}

impl RouteError {
    /// A forwarded error with no status; the default handler answers 500.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Attach a status code. Values outside 400..=599 are ignored by the
    /// default handler.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn not_found(method: &Method, path: &str) -> Self {
        Self::new(format!("Cannot {} {}", method, path)).with_status(404)
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_string());
        Self::new(detail)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raw declared status, valid or not.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// The status the default handler answers with.
    pub fn response_status(&self) -> StatusCode {
        self.status
            .filter(|s| (400..=599).contains(s))
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl<E> From<E> for RouteError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self {
            message: err.to_string(),
            status: None,
            source: Some(Box::new(err)),
        }
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteError")
            .field("message", &self.message)
            .field("status", &self.status)
            .field("source", &self.source)
            .finish()
    }
}

/// The parts of a request still available once the body has been handed off.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub request_id: String,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestHead {
    /// Snapshot a request, reusing its `x-request-id` or minting a UUID v4.
    pub fn from_request(req: &Request<Body>) -> Self {
        let request_id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            request_id,
            method: req.method().clone(),
            uri: req.uri().clone(),
            headers: req.headers().clone(),
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }
}

/// A regular request handler.
pub trait RequestHandler: Send + Sync + 'static {
    fn call(&self, req: Request<Body>) -> HandlerFuture;
}

impl<F, Fut, R> RequestHandler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request<Body>) -> HandlerFuture {
        let fut = self(req);
        Box::pin(async move { fut.await.map(IntoResponse::into_response) })
    }
}

/// A handler that returns its value directly instead of a future.
pub struct SyncHandler<F>(F);

impl<F, R> RequestHandler for SyncHandler<F>
where
    F: Fn(Request<Body>) -> Result<R, RouteError> + Send + Sync + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request<Body>) -> HandlerFuture {
        let result = (self.0)(req).map(IntoResponse::into_response);
        Box::pin(async move { result })
    }
}

/// An error handler: receives a forwarded error, answers it or forwards it on.
pub trait ErrorHandler: Send + Sync + 'static {
    fn call(&self, err: RouteError, head: RequestHead) -> HandlerFuture;
}

impl<F, Fut, R> ErrorHandler for F
where
    F: Fn(RouteError, RequestHead) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, err: RouteError, head: RequestHead) -> HandlerFuture {
        let fut = self(err, head);
        Box::pin(async move { fut.await.map(IntoResponse::into_response) })
    }
}

/// A user handler bound to whatever state it closes over.
#[derive(Clone)]
pub enum BoundHandler {
    Request(Arc<dyn RequestHandler>),
    Error(Arc<dyn ErrorHandler>),
}

impl BoundHandler {
    /// Bind an async request handler.
    pub fn new<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        BoundHandler::Request(Arc::new(handler))
    }

    /// Bind a synchronous request handler.
    pub fn sync<F, R>(handler: F) -> Self
    where
        F: Fn(Request<Body>) -> Result<R, RouteError> + Send + Sync + 'static,
        R: IntoResponse,
    {
        BoundHandler::Request(Arc::new(SyncHandler(handler)))
    }

    /// Bind an async error handler.
    pub fn error<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RouteError, RequestHead) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        BoundHandler::Error(Arc::new(handler))
    }

    /// Bind a type implementing [`RequestHandler`] directly.
    pub fn from_request_handler(handler: impl RequestHandler) -> Self {
        BoundHandler::Request(Arc::new(handler))
    }

    /// Bind a type implementing [`ErrorHandler`] directly.
    pub fn from_error_handler(handler: impl ErrorHandler) -> Self {
        BoundHandler::Error(Arc::new(handler))
    }

    pub fn is_error_handler(&self) -> bool {
        matches!(self, BoundHandler::Error(_))
    }

    /// Whether two bindings share one handler instance.
    pub fn same_handler(&self, other: &BoundHandler) -> bool {
        match (self, other) {
            (BoundHandler::Request(a), BoundHandler::Request(b)) => Arc::ptr_eq(a, b),
            (BoundHandler::Error(a), BoundHandler::Error(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for BoundHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundHandler::Request(_) => f.write_str("BoundHandler::Request"),
            BoundHandler::Error(_) => f.write_str("BoundHandler::Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_status() {
        assert_eq!(RouteError::new("x").response_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            RouteError::new("x").with_status(418).response_status(),
            StatusCode::IM_A_TEAPOT
        );
        assert_eq!(
            RouteError::new("x").with_status(302).response_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RouteError::new("x").with_status(9999).response_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_std_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: RouteError = io.into();
        assert_eq!(err.message(), "disk gone");
        assert!(err.source().is_some());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_panic_payloads() {
        let err = RouteError::from_panic(Box::new("boom"));
        assert_eq!(err.message(), "boom");
        let err = RouteError::from_panic(Box::new(String::from("bang")));
        assert_eq!(err.message(), "bang");
        let err = RouteError::from_panic(Box::new(7_u8));
        assert_eq!(err.message(), "handler panicked");
    }

    #[test]
    fn test_request_head_reuses_request_id() {
        let req = Request::builder()
            .uri("/a/b?x=1")
            .header(X_REQUEST_ID, "abc")
            .body(Body::empty())
            .unwrap();
        let head = RequestHead::from_request(&req);
        assert_eq!(head.request_id, "abc");
        assert_eq!(head.path(), "/a/b");

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(RequestHead::from_request(&req).request_id.len(), 36);
    }

    #[test]
    fn test_bound_handler_kinds() {
        let h = BoundHandler::sync(|_req| Ok::<_, RouteError>("ok"));
        assert!(!h.is_error_handler());
        assert!(h.same_handler(&h.clone()));

        let e = BoundHandler::error(|err, _head| async move { Err::<&'static str, _>(err) });
        assert!(e.is_error_handler());
        assert!(!h.same_handler(&e));
    }
}
