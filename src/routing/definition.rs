//! Route definitions and the routing table.
//!
//! # Responsibilities
//! - Hold one resolved (path, verb) row per handler and verb
//! - Collect every row from a full discovery pass
//! - Log the discovered table for operators
//!
//! # Design Decisions
//! - Rows are immutable once built; the table is only appended to during
//!   discovery and is consumed by registration
//! - Display order (by source file) is separate from validation order (by path)

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::http::handler::BoundHandler;
use crate::http::middleware::MiddlewareRef;
use crate::routing::verb::Verb;

/// One resolved route.
#[derive(Clone)]
pub struct RouteDefinition {
    source_file: PathBuf,
    handler_name: String,
    route_path: String,
    verb: Verb,
    middleware: Vec<MiddlewareRef>,
    handler: BoundHandler,
}

impl RouteDefinition {
    pub fn new(
        source_file: impl Into<PathBuf>,
        handler_name: impl Into<String>,
        route_path: impl Into<String>,
        verb: Verb,
        middleware: Vec<MiddlewareRef>,
        handler: BoundHandler,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            handler_name: handler_name.into(),
            route_path: route_path.into(),
            verb,
            middleware,
            handler,
        }
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    pub fn route_path(&self) -> &str {
        &self.route_path
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn middleware(&self) -> &[MiddlewareRef] {
        &self.middleware
    }

    pub fn handler(&self) -> &BoundHandler {
        &self.handler
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            verb: self.verb,
            path: self.route_path.clone(),
            source_file: self.source_file.display().to_string(),
            handler: self.handler_name.clone(),
            error_handler: self.handler.is_error_handler(),
            middleware: self.middleware.iter().map(|m| m.name().to_string()).collect(),
        }
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let middleware: Vec<&str> = self.middleware.iter().map(|m| m.name()).collect();
        f.debug_struct("RouteDefinition")
            .field("source_file", &self.source_file)
            .field("handler_name", &self.handler_name)
            .field("route_path", &self.route_path)
            .field("verb", &self.verb)
            .field("middleware", &middleware)
            .field("handler", &self.handler)
            .finish()
    }
}

/// `VERB - PATH - SOURCE_FILE`
impl fmt::Display for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.verb.as_str().to_ascii_uppercase(),
            self.route_path,
            self.source_file.display()
        )
    }
}

/// Serializable view of a route for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub verb: Verb,
    pub path: String,
    pub source_file: String,
    pub handler: String,
    pub error_handler: bool,
    pub middleware: Vec<String>,
}

/// Every route produced by one discovery pass.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<RouteDefinition>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, route: RouteDefinition) {
        self.routes.push(route);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Rows in discovery order.
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn into_routes(self) -> Vec<RouteDefinition> {
        self.routes
    }

    /// Rows ordered by (source file, path, verb).
    pub fn by_source(&self) -> Vec<&RouteDefinition> {
        let mut rows: Vec<&RouteDefinition> = self.routes.iter().collect();
        rows.sort_by(|a, b| {
            a.source_file
                .cmp(&b.source_file)
                .then_with(|| a.route_path.cmp(&b.route_path))
                .then_with(|| a.verb.cmp(&b.verb))
        });
        rows
    }

    /// Rows ordered by (path, verb).
    pub fn by_path(&self) -> Vec<&RouteDefinition> {
        let mut rows: Vec<&RouteDefinition> = self.routes.iter().collect();
        rows.sort_by(|a, b| {
            a.route_path
                .as_bytes()
                .cmp(b.route_path.as_bytes())
                .then_with(|| a.verb.cmp(&b.verb))
        });
        rows
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.by_path().into_iter().map(RouteDefinition::summary).collect()
    }

    /// One `info` line per route grouped by source file, then the path-ordered
    /// table at `debug`.
    pub fn log_routes(&self) {
        for route in self.by_source() {
            tracing::info!("{}", route);
        }
        for route in self.by_path() {
            tracing::debug!(
                verb = %route.verb,
                path = %route.route_path,
                source = %route.source_file.display(),
                "Route table entry"
            );
        }
    }
}
