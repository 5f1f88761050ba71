//! Shared fixtures for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use autoroute::config::{AutorouteConfig, RootConfig};
use autoroute::discovery::{HandlerMetadata, HandlerSpec, MemorySource, ModuleExport};
use autoroute::http::{BoundHandler, RouteError};
use autoroute::Pipeline;

/// Root every in-memory tree is mounted under.
pub const ROOT: &str = "/srv/routes";

/// Default config with a single root at `ROOT`.
pub fn config() -> AutorouteConfig {
    let mut config = AutorouteConfig::default();
    config.discovery.roots = vec![RootConfig {
        path: ROOT.into(),
        prefix: "/".to_string(),
    }];
    config
}

/// `ROOT` joined with a relative route file path.
pub fn at(relative: &str) -> String {
    format!("{}/{}", ROOT, relative)
}

/// A handler answering `body` with 200.
pub fn text(name: &str, body: &'static str) -> HandlerSpec {
    HandlerSpec::new(name, BoundHandler::sync(move |_req| Ok::<_, RouteError>(body)))
}

/// Like [`text`] with metadata.
pub fn text_with(name: &str, body: &'static str, meta: HandlerMetadata) -> HandlerSpec {
    text(name, body).meta(meta)
}

/// Discovery lines (`VERB - PATH - FILE`) in table order.
pub fn discovered(source: MemorySource) -> Result<Vec<String>, autoroute::SetupError> {
    discovered_with(config(), source)
}

pub fn discovered_with(
    config: AutorouteConfig,
    source: MemorySource,
) -> Result<Vec<String>, autoroute::SetupError> {
    let table = Pipeline::new(config, source).discover()?;
    Ok(table.routes().iter().map(|r| r.to_string()).collect())
}

/// Router built from `source` with default config.
pub fn app(source: MemorySource) -> Router {
    Pipeline::new(config(), source)
        .build()
        .expect("route tree should build")
}

/// Send one request through `router`.
pub async fn send(router: &Router, method: Method, uri: &str, body: Body) -> Response<Body> {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .expect("valid request");
    router.clone().oneshot(req).await.expect("infallible")
}

pub async fn send_req(router: &Router, req: Request<Body>) -> Response<Body> {
    router.clone().oneshot(req).await.expect("infallible")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let text = body_string(response).await;
    serde_json::from_str(&text).expect("json body")
}

/// A single-export module factory as a closure.
pub fn object(handlers: Vec<HandlerSpec>) -> impl Fn() -> ModuleExport + Send + Sync + 'static {
    move || ModuleExport::Object(handlers.clone())
}
