//! Recursive route tree traversal.
//!
//! # Responsibilities
//! - Visit every directory under a root exactly once
//! - Hand each eligible file to the module loader and route builder
//! - Grow the prefix by one lower-cased segment per directory level
//!
//! # Design Decisions
//! - Entries are visited in byte order of their names, files before
//!   subdirectories, so logs read the same on every platform
//! - Dot-prefixed entries are skipped, as are files excluded by extension
//!   or by the skip list

use std::path::Path;

use crate::config::DiscoveryConfig;
use crate::discovery::module::ModuleLoader;
use crate::discovery::source::RouteSource;
use crate::error::SetupError;
use crate::routing::builder::normalize_prefix;
use crate::routing::{RouteBuilder, RoutingTable};

pub struct RouteTreeWalker<'a> {
    source: &'a dyn RouteSource,
    builder: &'a RouteBuilder,
    extensions: &'a [String],
    skip_files: &'a [String],
}

impl<'a> RouteTreeWalker<'a> {
    pub fn new(
        source: &'a dyn RouteSource,
        builder: &'a RouteBuilder,
        discovery: &'a DiscoveryConfig,
    ) -> Self {
        Self {
            source,
            builder,
            extensions: &discovery.extensions,
            skip_files: &discovery.skip_files,
        }
    }

    /// Walk `dir` with `prefix` as the accumulated route prefix, appending
    /// every resolved row to `table`.
    pub fn walk(&self, dir: &Path, prefix: &str, table: &mut RoutingTable) -> Result<(), SetupError> {
        let prefix = normalize_prefix(prefix);
        tracing::debug!(dir = %dir.display(), prefix = %prefix, "Walking route directory");

        let mut names = self.source.list_directory(dir)?;
        names.sort();

        let mut subdirs = Vec::new();
        for name in names {
            if name.starts_with('.') {
                continue;
            }
            let path = dir.join(&name);
            if self.source.is_directory(&path)? {
                subdirs.push((name, path));
            } else if self.is_route_file(&name) {
                self.visit_file(&path, &prefix, table)?;
            } else {
                tracing::trace!(file = %path.display(), "Skipping non-route file");
            }
        }

        for (name, path) in subdirs {
            let child = format!("{}{}/", prefix, name.to_lowercase());
            self.walk(&path, &child, table)?;
        }
        Ok(())
    }

    fn visit_file(&self, path: &Path, prefix: &str, table: &mut RoutingTable) -> Result<(), SetupError> {
        let units = ModuleLoader::load(self.source, path)?;
        for unit in units {
            let label = unit.label.clone();
            let emitted = self.builder.build(unit, prefix, table)?;
            tracing::debug!(
                file = %path.display(),
                unit = %label,
                routes = emitted,
                "Resolved route unit"
            );
        }
        Ok(())
    }

    fn is_route_file(&self, name: &str) -> bool {
        if self.skip_files.iter().any(|skip| skip == name) {
            return false;
        }
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BodyConfig, RoutingOptions, UploadConfig};
    use crate::discovery::metadata::HandlerMetadata;
    use crate::discovery::module::{ClassSpec, HandlerSpec, ModuleExport};
    use crate::discovery::source::MemorySource;
    use crate::http::handler::{BoundHandler, RouteError};
    use crate::http::middleware::{MiddlewareComposer, UploadMiddlewareCache};
    use crate::routing::Verb;

    fn builder() -> RouteBuilder {
        let composer = MiddlewareComposer::new(
            &BodyConfig::default(),
            &UploadConfig::default(),
            UploadMiddlewareCache::new(),
        );
        RouteBuilder::new(RoutingOptions::default(), false, composer)
    }

    fn ok(name: &str) -> HandlerSpec {
        HandlerSpec::new(name, BoundHandler::sync(|_req| Ok::<_, RouteError>("ok")))
    }

    fn sales() -> ModuleExport {
        ModuleExport::Class(
            ClassSpec::new("Sales")
                .method(ok("m1"))
                .method(ok("index").meta(HandlerMetadata::new().post())),
        )
    }

    fn health() -> ModuleExport {
        ModuleExport::Object(vec![ok("live"), ok("ready")])
    }

    fn root() -> ModuleExport {
        ModuleExport::Function(ok("home"))
    }

    fn walk(source: &MemorySource, discovery: &DiscoveryConfig) -> Result<Vec<String>, SetupError> {
        let builder = builder();
        let walker = RouteTreeWalker::new(source, &builder, discovery);
        let mut table = RoutingTable::new();
        walker.walk(Path::new("/routes"), "/", &mut table)?;
        Ok(table.routes().iter().map(|r| r.to_string()).collect())
    }

    #[test]
    fn test_files_before_directories_in_name_order() {
        let source = MemorySource::new()
            .module("/routes/Api/sales.rs", sales)
            .module("/routes/index.rs", root)
            .module("/routes/health.rs", health)
            .file("/routes/mod.rs")
            .file("/routes/notes.txt")
            .module("/routes/.hidden.rs", health);

        let rows = walk(&source, &DiscoveryConfig::default()).unwrap();
        assert_eq!(
            rows,
            vec![
                "GET - /health/live - /routes/health.rs",
                "GET - /health/ready - /routes/health.rs",
                "GET - / - /routes/index.rs",
                "GET - /api/sales/m1 - /routes/Api/sales.rs",
                "POST - /api/sales - /routes/Api/sales.rs",
            ]
        );
    }

    #[test]
    fn test_custom_extensions_and_skip_list() {
        let source = MemorySource::new()
            .module("/routes/a.route", health)
            .module("/routes/b.rs", health)
            .module("/routes/skip.route", health);
        let discovery = DiscoveryConfig {
            extensions: vec!["route".to_string()],
            skip_files: vec!["skip.route".to_string()],
            ..DiscoveryConfig::default()
        };
        let rows = walk(&source, &discovery).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.ends_with("/routes/a.route")));
    }

    #[test]
    fn test_unregistered_file_is_fatal() {
        let source = MemorySource::new().file("/routes/orphan.rs");
        assert!(matches!(
            walk(&source, &DiscoveryConfig::default()),
            Err(SetupError::ModuleNotRegistered { .. })
        ));
    }

    #[test]
    fn test_prefix_is_normalized() {
        let source = MemorySource::new().module("/routes/health.rs", health);
        let builder = builder();
        let discovery = DiscoveryConfig::default();
        let walker = RouteTreeWalker::new(&source, &builder, &discovery);
        let mut table = RoutingTable::new();
        walker.walk(Path::new("/routes"), "v1", &mut table).unwrap();
        assert_eq!(table.routes()[0].route_path(), "/v1/health/live");
        assert_eq!(table.routes()[0].verb(), Verb::Get);
    }
}
