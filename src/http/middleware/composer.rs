//! Middleware chain assembly for resolved routes.
//!
//! # Responsibilities
//! - Attach upload or body-decoding middleware to body-capable verbs
//! - Append user-declared middleware in declaration order
//!
//! # Design Decisions
//! - The standard pair is built once and shared by every route
//! - Upload middleware comes from the injected cache, never built inline

use std::sync::Arc;

use crate::config::{BodyConfig, UploadConfig};
use crate::http::middleware::{JsonBody, MiddlewareRef, UploadMiddlewareCache, UrlEncodedBody};
use crate::routing::verb::Verb;

/// Builds the middleware chain for one (route, verb) row.
#[derive(Clone)]
pub struct MiddlewareComposer {
    standard: Vec<MiddlewareRef>,
    uploads: UploadMiddlewareCache,
    default_upload_limit: u64,
}

impl MiddlewareComposer {
    pub fn new(body: &BodyConfig, uploads: &UploadConfig, cache: UploadMiddlewareCache) -> Self {
        let standard: Vec<MiddlewareRef> = if body.disabled {
            Vec::new()
        } else {
            vec![
                Arc::new(JsonBody::new(body.json_limit_bytes)),
                Arc::new(UrlEncodedBody::new(body.urlencoded_limit_bytes)),
            ]
        };
        Self {
            standard,
            uploads: cache,
            default_upload_limit: uploads.default_limit_bytes,
        }
    }

    /// Limit used by handlers that request an upload without a size.
    pub fn default_upload_limit(&self) -> u64 {
        self.default_upload_limit
    }

    /// The chain for `verb`: upload middleware if `upload_limit` is set, else the
    /// standard pair, for body-capable verbs only; then `declared`, in order.
    pub fn compose(
        &self,
        verb: Verb,
        upload_limit: Option<u64>,
        declared: &[MiddlewareRef],
    ) -> Vec<MiddlewareRef> {
        let mut chain = Vec::with_capacity(self.standard.len() + declared.len());
        if verb.is_body_capable() {
            match upload_limit {
                Some(limit) => chain.push(self.uploads.get_or_create(limit)),
                None => chain.extend(self.standard.iter().cloned()),
            }
        }
        chain.extend(declared.iter().cloned());
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::middleware::{from_fn, MiddlewareResult};
    use axum::body::Body;
    use axum::http::Request;

    fn composer(body_disabled: bool) -> MiddlewareComposer {
        let body = BodyConfig {
            disabled: body_disabled,
            ..BodyConfig::default()
        };
        MiddlewareComposer::new(&body, &UploadConfig::default(), UploadMiddlewareCache::new())
    }

    fn names(chain: &[MiddlewareRef]) -> Vec<&str> {
        chain.iter().map(|m| m.name()).collect()
    }

    fn user() -> MiddlewareRef {
        from_fn("user", |req: Request<Body>| async move {
            Ok(MiddlewareResult::Continue(req))
        })
    }

    #[test]
    fn test_body_verbs_get_standard_pair() {
        let c = composer(false);
        assert_eq!(names(&c.compose(Verb::Post, None, &[user()])), vec!["json", "urlencoded", "user"]);
        assert_eq!(names(&c.compose(Verb::All, None, &[])), vec!["json", "urlencoded"]);
    }

    #[test]
    fn test_non_body_verbs_get_only_declared() {
        let c = composer(false);
        assert_eq!(names(&c.compose(Verb::Get, None, &[user()])), vec!["user"]);
        assert!(c.compose(Verb::Head, None, &[]).is_empty());
    }

    #[test]
    fn test_upload_replaces_standard_pair() {
        let c = composer(false);
        assert_eq!(
            names(&c.compose(Verb::Put, Some(1_000_000), &[user()])),
            vec!["file-upload", "user"]
        );
    }

    #[test]
    fn test_upload_instances_shared_across_routes() {
        let c = composer(false);
        let a = c.compose(Verb::Post, Some(512), &[]);
        let b = c.compose(Verb::Patch, Some(512), &[]);
        assert!(Arc::ptr_eq(&a[0], &b[0]));
    }

    #[test]
    fn test_body_parsing_disabled() {
        let c = composer(true);
        assert_eq!(names(&c.compose(Verb::Post, None, &[user()])), vec!["user"]);
        assert_eq!(names(&c.compose(Verb::Post, Some(10), &[])), vec!["file-upload"]);
    }
}
