//! Route resolution: annotations plus prefix in, route definitions out.
//!
//! # Responsibilities
//! - Compute a class prefix once per route unit
//! - Compute each handler's final path and verb set
//! - Attach the composed middleware chain to every emitted row
//!
//! # Design Decisions
//! - Prefixes always start and end with `/`; paths never end with `/` unless
//!   they are exactly `/`
//! - `hidden` beats every other annotation
//! - `all` swallows every other declared verb
//! - All checks on a handler run before any of its rows are emitted

use std::collections::BTreeSet;
use std::path::Path;

use crate::config::{RoutingOptions, VerbDefault};
use crate::discovery::metadata::{Annotated, ClassMetadata, HandlerMetadata, UploadLimit};
use crate::discovery::module::{HandlerSpec, RouteUnit, UnitShape};
use crate::error::SetupError;
use crate::http::middleware::MiddlewareComposer;
use crate::routing::definition::{RouteDefinition, RoutingTable};
use crate::routing::verb::{UnknownVerb, Verb};

/// Route segment meaning "no segment".
const INDEX: &str = "index";

/// Resolves route units into routing table rows.
pub struct RouteBuilder {
    options: RoutingOptions,
    uploads_disabled: bool,
    composer: MiddlewareComposer,
}

impl RouteBuilder {
    pub fn new(options: RoutingOptions, uploads_disabled: bool, composer: MiddlewareComposer) -> Self {
        Self {
            options,
            uploads_disabled,
            composer,
        }
    }

    /// Resolve every handler in `unit` under `prefix`. Returns the number of
    /// rows appended to `table`.
    pub fn build(
        &self,
        unit: RouteUnit,
        prefix: &str,
        table: &mut RoutingTable,
    ) -> Result<usize, SetupError> {
        let RouteUnit {
            file,
            fallback_name,
            shape,
            ..
        } = unit;

        let mut emitted = 0;
        match shape {
            UnitShape::Class(mut class) => {
                let class_meta = class.extract();
                let class_prefix =
                    self.class_prefix(prefix, &class_meta, Some(class.type_name()), &fallback_name);
                for mut method in class.into_methods() {
                    emitted += self.build_handler(&class_prefix, &mut method, None, &file, table)?;
                }
            }
            UnitShape::Object(handlers) => {
                let object_prefix =
                    self.class_prefix(prefix, &ClassMetadata::default(), None, &fallback_name);
                for mut handler in handlers {
                    emitted += self.build_handler(&object_prefix, &mut handler, None, &file, table)?;
                }
            }
            UnitShape::Function(mut handler) => {
                let function_prefix =
                    self.class_prefix(prefix, &ClassMetadata::default(), None, &fallback_name);
                emitted +=
                    self.build_handler(&function_prefix, &mut handler, Some(INDEX), &file, table)?;
            }
        }
        Ok(emitted)
    }

    /// The prefix shared by every handler of a class.
    pub fn class_prefix(
        &self,
        prefix: &str,
        meta: &ClassMetadata,
        type_name: Option<&str>,
        fallback_name: &str,
    ) -> String {
        if let Some(route) = &meta.full_route {
            let mut class_route = with_leading_slash(route);
            if !class_route.ends_with('/') {
                class_route.push('/');
            }
            return class_route;
        }

        let name = meta
            .name_override
            .as_deref()
            .or(type_name.filter(|_| self.options.use_type_name_for_prefix))
            .unwrap_or(fallback_name);
        let segment = name.trim_matches('/');
        if segment.is_empty() || segment.eq_ignore_ascii_case(INDEX) {
            prefix.to_string()
        } else {
            format!("{}{}/", prefix, segment)
        }
    }

    fn build_handler(
        &self,
        prefix: &str,
        spec: &mut HandlerSpec,
        route_name: Option<&str>,
        file: &Path,
        table: &mut RoutingTable,
    ) -> Result<usize, SetupError> {
        let meta = spec.extract();
        let name = spec.name().to_string();

        if meta.hidden {
            tracing::debug!(handler = %name, file = %file.display(), "Skipping hidden handler");
            return Ok(0);
        }

        let Some(verbs) = self.resolve_verbs(&meta.verbs, &name, file)? else {
            tracing::debug!(handler = %name, file = %file.display(), "Skipping handler without verbs");
            return Ok(0);
        };

        let upload_limit = match meta.upload {
            None => None,
            Some(_) if self.uploads_disabled => {
                return Err(SetupError::UploadsDisabled {
                    handler: name,
                    file: file.to_path_buf(),
                })
            }
            Some(_) if !verbs.iter().any(Verb::is_body_capable) => {
                return Err(SetupError::UploadWithoutBodyVerb {
                    handler: name,
                    file: file.to_path_buf(),
                })
            }
            Some(UploadLimit::Default) => Some(self.composer.default_upload_limit()),
            Some(UploadLimit::Bytes(bytes)) => Some(bytes),
        };

        let path = resolve_path(prefix, &meta, route_name.unwrap_or(&name));
        if let Err(detail) = check_path(&path) {
            return Err(SetupError::InvalidPath {
                path,
                detail: detail.to_string(),
                handler: name,
                file: file.to_path_buf(),
            });
        }
        for &verb in &verbs {
            let middleware = self.composer.compose(verb, upload_limit, &meta.middleware);
            table.push(RouteDefinition::new(
                file,
                name.as_str(),
                path.as_str(),
                verb,
                middleware,
                spec.handler().clone(),
            ));
        }
        Ok(verbs.len())
    }

    /// The verbs a handler answers, or `None` when it must not be routed.
    pub fn resolve_verbs(
        &self,
        declared: &[String],
        handler: &str,
        file: &Path,
    ) -> Result<Option<Vec<Verb>>, SetupError> {
        if declared.is_empty() {
            return Ok(match self.options.verb_default() {
                VerbDefault::Get => Some(vec![Verb::Get]),
                VerbDefault::All => Some(vec![Verb::All]),
                VerbDefault::Hidden => None,
            });
        }

        let mut verbs = BTreeSet::new();
        for name in declared {
            let verb = name
                .parse::<Verb>()
                .map_err(|UnknownVerb(verb)| SetupError::InvalidVerb {
                    verb,
                    handler: handler.to_string(),
                    file: file.to_path_buf(),
                })?;
            verbs.insert(verb);
        }

        if verbs.contains(&Verb::All) {
            return Ok(Some(vec![Verb::All]));
        }
        Ok(Some(verbs.into_iter().collect()))
    }
}

/// A handler's final path under `prefix`.
pub fn resolve_path(prefix: &str, meta: &HandlerMetadata, declared_name: &str) -> String {
    let path = match &meta.full_route {
        Some(route) => with_leading_slash(route),
        None => {
            let raw = meta.name_override.as_deref().unwrap_or(declared_name);
            let name = raw.strip_prefix('/').unwrap_or(raw);
            if name.is_empty() || name.eq_ignore_ascii_case(INDEX) {
                prefix.to_string()
            } else {
                format!("{}{}", prefix, name)
            }
        }
    };
    without_trailing_slash(path)
}

/// Reject segments the router cannot register: unnamed `:` parameters and
/// wildcards anywhere but the last segment.
pub fn check_path(path: &str) -> Result<(), &'static str> {
    let segments: Vec<&str> = path.split('/').collect();
    for (i, segment) in segments.iter().enumerate() {
        if *segment == ":" {
            return Err("parameter segment has no name");
        }
        if segment.starts_with('*') && i + 1 != segments.len() {
            return Err("wildcard segment must be last");
        }
    }
    Ok(())
}

/// Force a directory-style prefix: leading and trailing `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    let mut normalized = with_leading_slash(prefix);
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

fn with_leading_slash(route: &str) -> String {
    if route.starts_with('/') {
        route.to_string()
    } else {
        format!("/{}", route)
    }
}

fn without_trailing_slash(mut path: String) -> String {
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::config::{BodyConfig, UploadConfig};
    use crate::discovery::metadata::HandlerMetadata;
    use crate::discovery::module::ClassSpec;
    use crate::http::handler::{BoundHandler, RouteError};
    use crate::http::middleware::{from_fn, MiddlewareResult, UploadMiddlewareCache};

    fn builder(options: RoutingOptions) -> RouteBuilder {
        let composer = MiddlewareComposer::new(
            &BodyConfig::default(),
            &UploadConfig::default(),
            UploadMiddlewareCache::new(),
        );
        RouteBuilder::new(options, false, composer)
    }

    fn handler(name: &str, meta: HandlerMetadata) -> HandlerSpec {
        HandlerSpec::new(name, BoundHandler::sync(|_req| Ok::<_, RouteError>("ok"))).meta(meta)
    }

    fn unit(file: &str, shape: UnitShape) -> RouteUnit {
        let file = PathBuf::from(file);
        RouteUnit {
            fallback_name: file.file_stem().unwrap().to_string_lossy().to_lowercase(),
            file,
            label: "test".to_string(),
            shape,
        }
    }

    fn rows(table: &RoutingTable) -> Vec<(String, Verb)> {
        table
            .routes()
            .iter()
            .map(|r| (r.route_path().to_string(), r.verb()))
            .collect()
    }

    #[test]
    fn test_path_normalization() {
        let none = HandlerMetadata::new();
        assert_eq!(resolve_path("/api/sales/", &none, "m1"), "/api/sales/m1");
        assert_eq!(resolve_path("/api/sales/", &none, "index"), "/api/sales");
        assert_eq!(resolve_path("/api/sales/", &none, "INDEX"), "/api/sales");
        assert_eq!(resolve_path("/api/sales/", &none, ""), "/api/sales");
        assert_eq!(resolve_path("/", &none, "index"), "/");
        assert_eq!(resolve_path("/api/", &none, "/m2"), "/api/m2");
    }

    #[test]
    fn test_check_path() {
        assert!(check_path("/").is_ok());
        assert!(check_path("/api/sales/:id").is_ok());
        assert!(check_path("/files/*rest").is_ok());
        assert!(check_path("/a/:").is_err());
        assert!(check_path("/:/b").is_err());
        assert!(check_path("/files/*/meta").is_err());
    }

    #[test]
    fn test_unnamed_parameter_is_fatal() {
        let b = builder(RoutingOptions::default());
        let u = unit(
            "/r/items.rs",
            UnitShape::Object(vec![handler("odd", HandlerMetadata::new().name(":"))]),
        );
        let mut table = RoutingTable::new();
        match b.build(u, "/", &mut table).unwrap_err() {
            SetupError::InvalidPath { path, handler, .. } => {
                assert_eq!(path, "/items/:");
                assert_eq!(handler, "odd");
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(table.is_empty());
    }

    #[test]
    fn test_overrides() {
        let named = HandlerMetadata::new().name("items/");
        assert_eq!(resolve_path("/api/", &named, "list"), "/api/items");

        let full = HandlerMetadata::new().full_route("shared").name("ignored");
        assert_eq!(resolve_path("/api/", &full, "list"), "/shared");

        let root = HandlerMetadata::new().full_route("/");
        assert_eq!(resolve_path("/api/", &root, "list"), "/");
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix(""), "/");
        assert_eq!(normalize_prefix("api"), "/api/");
        assert_eq!(normalize_prefix("/api/"), "/api/");
    }

    #[test]
    fn test_class_prefix_rules() {
        let b = builder(RoutingOptions::default());
        let none = ClassMetadata::new();
        assert_eq!(b.class_prefix("/api/", &none, Some("Sales"), "sales"), "/api/sales/");
        assert_eq!(b.class_prefix("/api/", &none, Some("Sales"), "index"), "/api/");
        assert_eq!(b.class_prefix("/api/", &none, None, ""), "/api/");
        assert_eq!(
            b.class_prefix("/api/", &ClassMetadata::new().name("Index/"), None, "sales"),
            "/api/"
        );
        assert_eq!(
            b.class_prefix("/api/", &ClassMetadata::new().name("orders"), Some("Sales"), "sales"),
            "/api/orders/"
        );
        assert_eq!(
            b.class_prefix("/api/", &ClassMetadata::new().full_route("v2/shop"), None, "sales"),
            "/v2/shop/"
        );
        assert_eq!(
            b.class_prefix("/api/", &ClassMetadata::new().full_route(""), None, "sales"),
            "/"
        );

        let typed = builder(RoutingOptions {
            use_type_name_for_prefix: true,
            ..RoutingOptions::default()
        });
        assert_eq!(typed.class_prefix("/", &none, Some("Sales"), "file"), "/Sales/");
        assert_eq!(typed.class_prefix("/", &none, None, "file"), "/file/");
    }

    #[test]
    fn test_get_get_all_collapses_to_one_all_row() {
        let b = builder(RoutingOptions::default());
        let mut table = RoutingTable::new();
        let u = unit(
            "/routes/a.rs",
            UnitShape::Object(vec![handler("list", HandlerMetadata::new().get().get().all())]),
        );
        assert_eq!(b.build(u, "/", &mut table).unwrap(), 1);
        assert_eq!(rows(&table), vec![("/a/list".to_string(), Verb::All)]);
    }

    #[test]
    fn test_multiple_verbs_share_handler() {
        let b = builder(RoutingOptions::default());
        let mut table = RoutingTable::new();
        let u = unit(
            "/routes/a.rs",
            UnitShape::Object(vec![handler("item", HandlerMetadata::new().post().get().post())]),
        );
        b.build(u, "/", &mut table).unwrap();
        assert_eq!(
            rows(&table),
            vec![("/a/item".to_string(), Verb::Get), ("/a/item".to_string(), Verb::Post)]
        );
        let routes = table.routes();
        assert!(routes[0].handler().same_handler(routes[1].handler()));
        assert!(routes[0].middleware().is_empty());
        assert_eq!(routes[1].middleware().len(), 2);
    }

    #[test]
    fn test_hidden_overrides_everything() {
        let b = builder(RoutingOptions::default());
        let mut table = RoutingTable::new();
        let meta = HandlerMetadata::new()
            .full_route("/secret")
            .post()
            .method("BOGUS")
            .file_upload()
            .hidden();
        let u = unit("/routes/a.rs", UnitShape::Object(vec![handler("x", meta)]));
        assert_eq!(b.build(u, "/", &mut table).unwrap(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_upload_without_body_verb_is_fatal() {
        let b = builder(RoutingOptions::default());
        let mut table = RoutingTable::new();
        let u = unit(
            "/routes/a.rs",
            UnitShape::Object(vec![handler(
                "photo",
                HandlerMetadata::new().get().file_upload_limit(1_000),
            )]),
        );
        let err = b.build(u, "/", &mut table).unwrap_err();
        match err {
            SetupError::UploadWithoutBodyVerb { handler, file } => {
                assert_eq!(handler, "photo");
                assert_eq!(file, PathBuf::from("/routes/a.rs"));
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(table.is_empty());
    }

    #[test]
    fn test_upload_defaults_to_get_is_fatal_too() {
        let b = builder(RoutingOptions::default());
        let mut table = RoutingTable::new();
        let u = unit(
            "/routes/a.rs",
            UnitShape::Object(vec![handler("photo", HandlerMetadata::new().file_upload())]),
        );
        assert!(matches!(
            b.build(u, "/", &mut table),
            Err(SetupError::UploadWithoutBodyVerb { .. })
        ));
    }

    #[test]
    fn test_uploads_disabled_is_fatal() {
        let composer = MiddlewareComposer::new(
            &BodyConfig::default(),
            &UploadConfig::default(),
            UploadMiddlewareCache::new(),
        );
        let b = RouteBuilder::new(RoutingOptions::default(), true, composer);
        let mut table = RoutingTable::new();
        let u = unit(
            "/routes/a.rs",
            UnitShape::Object(vec![handler("photo", HandlerMetadata::new().post().file_upload())]),
        );
        assert!(matches!(
            b.build(u, "/", &mut table),
            Err(SetupError::UploadsDisabled { .. })
        ));
    }

    #[test]
    fn test_upload_chain() {
        let b = builder(RoutingOptions::default());
        let mut table = RoutingTable::new();
        let audit = from_fn("audit", |req| async move { Ok(MiddlewareResult::Continue(req)) });
        let meta = HandlerMetadata::new()
            .post()
            .file_upload_limit(1_000_000)
            .middleware(audit);
        let u = unit("/routes/files.rs", UnitShape::Object(vec![handler("store", meta)]));
        b.build(u, "/", &mut table).unwrap();

        let route = &table.routes()[0];
        let names: Vec<_> = route.middleware().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["file-upload", "audit"]);
    }

    #[test]
    fn test_invalid_verb_names_handler_and_file() {
        let b = builder(RoutingOptions::default());
        let mut table = RoutingTable::new();
        let u = unit(
            "/routes/a.rs",
            UnitShape::Object(vec![handler("purge", HandlerMetadata::new().method("PURGE"))]),
        );
        let err = b.build(u, "/", &mut table).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("PURGE"));
        assert!(message.contains("purge"));
        assert!(message.contains("/routes/a.rs"));
    }

    #[test]
    fn test_verb_default_policies() {
        let file = Path::new("/routes/a.rs");
        let get = builder(RoutingOptions::default());
        assert_eq!(get.resolve_verbs(&[], "h", file).unwrap(), Some(vec![Verb::Get]));

        let all = builder(RoutingOptions {
            all_verbs_by_default: true,
            ..RoutingOptions::default()
        });
        assert_eq!(all.resolve_verbs(&[], "h", file).unwrap(), Some(vec![Verb::All]));

        let hidden = builder(RoutingOptions {
            hidden_by_default: true,
            ..RoutingOptions::default()
        });
        assert_eq!(hidden.resolve_verbs(&[], "h", file).unwrap(), None);
        assert_eq!(
            hidden.resolve_verbs(&["put".to_string()], "h", file).unwrap(),
            Some(vec![Verb::Put])
        );
    }

    #[test]
    fn test_class_and_function_units() {
        let b = builder(RoutingOptions::default());
        let mut table = RoutingTable::new();

        let class = ClassSpec::new("SalesController")
            .method(handler("list", HandlerMetadata::new()))
            .method(handler("index", HandlerMetadata::new().post()));
        b.build(unit("/routes/api/sales.rs", UnitShape::Class(class)), "/api/", &mut table)
            .unwrap();

        let ping = handler("healthCheck", HandlerMetadata::new());
        b.build(unit("/routes/ping.rs", UnitShape::Function(ping)), "/", &mut table)
            .unwrap();

        assert_eq!(
            rows(&table),
            vec![
                ("/api/sales/list".to_string(), Verb::Get),
                ("/api/sales".to_string(), Verb::Post),
                ("/ping".to_string(), Verb::Get),
            ]
        );
        assert_eq!(table.routes()[2].handler_name(), "healthCheck");
    }

    #[test]
    fn test_class_annotations_are_consumed() {
        let b = builder(RoutingOptions::default());
        let mut table = RoutingTable::new();
        let class = ClassSpec::new("Reports")
            .meta(ClassMetadata::new().full_route("/r"))
            .method(handler("daily", HandlerMetadata::new()));
        b.build(unit("/routes/x.rs", UnitShape::Class(class)), "/deep/", &mut table)
            .unwrap();
        assert_eq!(rows(&table), vec![("/r/daily".to_string(), Verb::Get)]);
    }
}
