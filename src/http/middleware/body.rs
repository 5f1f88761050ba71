//! Body-decoding and upload middleware.
//!
//! # Responsibilities
//! - Buffer request bodies up to a configured limit
//! - Decode JSON and urlencoded payloads into request extensions
//! - Accept multipart uploads up to a per-route size limit
//!
//! # Design Decisions
//! - Each middleware acts only on its own content type and passes others through
//! - The raw bytes are re-attached so handlers can still read the body
//! - Oversized bodies answer 413, malformed ones 400

use axum::body::{Body, Bytes};
use axum::http::{header, Request};
use futures_util::future::BoxFuture;
use http_body_util::LengthLimitError;
use serde_json::Value;

use crate::http::handler::RouteError;
use crate::http::middleware::{Middleware, MiddlewareResult};

/// A decoded body, stored in request extensions.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// Marker left in request extensions by [`FileUpload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedBody {
    pub boundary: Option<String>,
    pub size: usize,
}

fn content_type(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase())
}

fn mime_of(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

fn declared_length(req: &Request<Body>) -> Option<u64> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn too_large(limit: u64) -> RouteError {
    RouteError::new(format!("request body exceeds {} bytes", limit)).with_status(413)
}

/// Buffer a body, enforcing `limit` both from `Content-Length` and while reading.
async fn buffer(req: Request<Body>, limit: u64) -> Result<(Request<Body>, Bytes), RouteError> {
    if declared_length(&req).is_some_and(|len| len > limit) {
        return Err(too_large(limit));
    }
    let (parts, body) = req.into_parts();
    let max = usize::try_from(limit).unwrap_or(usize::MAX);
    let bytes = axum::body::to_bytes(body, max).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.downcast_ref::<LengthLimitError>().is_some() {
            too_large(limit)
        } else {
            RouteError::new(format!("failed to read request body: {}", inner)).with_status(400)
        }
    })?;
    let req = Request::from_parts(parts, Body::from(bytes.clone()));
    Ok((req, bytes))
}

/// Decodes `application/json` (and `+json`) bodies.
#[derive(Debug, Clone)]
pub struct JsonBody {
    limit: usize,
}

impl JsonBody {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    fn accepts(content_type: &str) -> bool {
        let mime = mime_of(content_type);
        mime == "application/json" || mime.ends_with("+json")
    }
}

impl Middleware for JsonBody {
    fn name(&self) -> &str {
        "json"
    }

    fn handle(&self, req: Request<Body>) -> BoxFuture<'_, Result<MiddlewareResult, RouteError>> {
        Box::pin(async move {
            if !content_type(&req).is_some_and(|ct| Self::accepts(&ct)) {
                return Ok(MiddlewareResult::Continue(req));
            }
            let (mut req, bytes) = buffer(req, self.limit as u64).await?;
            if !bytes.is_empty() {
                let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
                    RouteError::new(format!("invalid JSON body: {}", e)).with_status(400)
                })?;
                req.extensions_mut().insert(ParsedBody::Json(value));
            }
            Ok(MiddlewareResult::Continue(req))
        })
    }
}

/// Decodes `application/x-www-form-urlencoded` bodies.
#[derive(Debug, Clone)]
pub struct UrlEncodedBody {
    limit: usize,
}

impl UrlEncodedBody {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Middleware for UrlEncodedBody {
    fn name(&self) -> &str {
        "urlencoded"
    }

    fn handle(&self, req: Request<Body>) -> BoxFuture<'_, Result<MiddlewareResult, RouteError>> {
        Box::pin(async move {
            let form = content_type(&req)
                .is_some_and(|ct| mime_of(&ct) == "application/x-www-form-urlencoded");
            if !form {
                return Ok(MiddlewareResult::Continue(req));
            }
            let (mut req, bytes) = buffer(req, self.limit as u64).await?;
            let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes).map_err(|e| {
                RouteError::new(format!("invalid urlencoded body: {}", e)).with_status(400)
            })?;
            req.extensions_mut().insert(ParsedBody::Form(fields));
            Ok(MiddlewareResult::Continue(req))
        })
    }
}

/// Accepts `multipart/form-data` uploads up to `limit` bytes.
#[derive(Debug, Clone)]
pub struct FileUpload {
    limit: u64,
}

impl FileUpload {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Middleware for FileUpload {
    fn name(&self) -> &str {
        "file-upload"
    }

    fn handle(&self, req: Request<Body>) -> BoxFuture<'_, Result<MiddlewareResult, RouteError>> {
        Box::pin(async move {
            let Some(ct) = content_type(&req) else {
                return Ok(MiddlewareResult::Continue(req));
            };
            if mime_of(&ct) != "multipart/form-data" {
                return Ok(MiddlewareResult::Continue(req));
            }
            let boundary = req
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .split(';')
                .skip(1)
                .filter_map(|param| {
                    let (key, value) = param.trim().split_once('=')?;
                    key.eq_ignore_ascii_case("boundary").then_some(value)
                })
                .map(|b| b.trim_matches('"').to_string())
                .next();
            let (mut req, bytes) = buffer(req, self.limit).await?;
            req.extensions_mut().insert(UploadedBody {
                boundary,
                size: bytes.len(),
            });
            Ok(MiddlewareResult::Continue(req))
        })
    }
}
