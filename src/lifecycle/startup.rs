//! Startup orchestration.
//!
//! # Responsibilities
//! - Walk every configured root into one routing table
//! - Validate the table before anything is registered
//! - Register adapted handlers, then bind and serve
//!
//! # Design Decisions
//! - Fail fast: any setup error is fatal and the listener is never bound
//! - Phases run strictly in order: Idle → Walking → Validating →
//!   Registering → Serving
//! - The table is consumed by registration and never exposed half-built

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::response::IntoResponse;
use axum::Router;

use crate::config::loader::ConfigError;
use crate::config::validation::validate_config;
use crate::config::AutorouteConfig;
use crate::discovery::{RouteSource, RouteTreeWalker};
use crate::error::{SetupError, StartupError};
use crate::http::dispatch;
use crate::http::errors::ErrorChain;
use crate::http::handler::{RequestHead, RouteError};
use crate::http::middleware::{MiddlewareComposer, UploadMiddlewareCache};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{ConflictValidator, RouteBuilder, RoutingTable};

/// Startup phase, in the order the pipeline runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Idle,
    Walking,
    Validating,
    Registering,
    Serving,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Walking => "walking",
            Phase::Validating => "validating",
            Phase::Registering => "registering",
            Phase::Serving => "serving",
        };
        f.write_str(name)
    }
}

fn enter(phase: Phase) {
    tracing::info!(phase = %phase, "Startup phase");
}

/// Discovery, validation and registration for one process.
pub struct Pipeline {
    config: AutorouteConfig,
    source: Box<dyn RouteSource + Send + Sync>,
    errors: ErrorChain,
    cache: UploadMiddlewareCache,
}

impl Pipeline {
    pub fn new(config: AutorouteConfig, source: impl RouteSource + Send + Sync + 'static) -> Self {
        Self {
            config,
            source: Box::new(source),
            errors: ErrorChain::new(),
            cache: UploadMiddlewareCache::new(),
        }
    }

    /// Install the application's error handler, tried before the default.
    #[must_use]
    pub fn error_handler<F, Fut, R>(mut self, handler: F) -> Self
    where
        F: Fn(RouteError, RequestHead) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        self.errors = ErrorChain::with_handler(Arc::new(handler));
        self
    }

    /// Share an upload middleware cache with other pipelines.
    #[must_use]
    pub fn with_cache(mut self, cache: UploadMiddlewareCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &AutorouteConfig {
        &self.config
    }

    /// Walk every root and validate the resulting table.
    pub fn discover(&self) -> Result<RoutingTable, SetupError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        enter(Phase::Walking);
        let composer = MiddlewareComposer::new(&self.config.body, &self.config.uploads, self.cache.clone());
        let builder = RouteBuilder::new(self.config.routing, self.config.uploads.disabled, composer);
        let walker = RouteTreeWalker::new(self.source.as_ref(), &builder, &self.config.discovery);

        let mut table = RoutingTable::new();
        for root in &self.config.discovery.roots {
            // Rows and errors carry absolute source paths.
            let path = std::path::absolute(&root.path).map_err(|e| SetupError::io(&root.path, e))?;
            let before = table.len();
            walker.walk(&path, &root.prefix, &mut table)?;
            tracing::info!(
                root = %path.display(),
                prefix = %root.prefix,
                routes = table.len() - before,
                "Discovered routes"
            );
        }

        if self.config.discovery.log_discovered_routes {
            table.log_routes();
        }

        enter(Phase::Validating);
        ConflictValidator::validate(table.routes())?;
        Ok(table)
    }

    /// Discover, validate and register. Returns the finished router.
    pub fn build(self) -> Result<Router, SetupError> {
        let table = self.discover()?;
        enter(Phase::Registering);
        Ok(dispatch::register(table, Arc::new(self.errors)))
    }

    /// Build, then bind and serve until `shutdown` fires. The metrics
    /// exporter, when enabled, starts only once the router is built.
    pub async fn serve(self, shutdown: &Shutdown) -> Result<(), StartupError> {
        let listener_config = self.config.listener.clone();
        let observability = self.config.observability.clone();
        let router = self.build()?;

        if observability.metrics_enabled {
            match observability.metrics_address.parse() {
                Ok(addr) => metrics::init_metrics(addr)?,
                Err(_) => tracing::error!(
                    metrics_address = %observability.metrics_address,
                    "Failed to parse metrics address"
                ),
            }
        }

        let server = HttpServer::new(router, listener_config);
        let listener = server.bind().await?;
        enter(Phase::Serving);
        server.run(listener, shutdown).await?;
        Ok(())
    }
}
