//! Route annotations on handlers and classes.
//!
//! Annotations are plain values built next to the handler they describe.
//! Extraction takes the bag out of its owner and leaves an empty one behind,
//! so a second extraction yields nothing and metadata never reaches the
//! adapted handler.

use std::fmt;

use crate::http::middleware::MiddlewareRef;

/// Requested upload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadLimit {
    /// Use `uploads.default_limit_bytes`.
    Default,
    Bytes(u64),
}

/// Per-handler annotation bag.
#[derive(Clone, Default)]
pub struct HandlerMetadata {
    pub full_route: Option<String>,
    pub name_override: Option<String>,
    /// Declared verb names, validated during route resolution.
    pub verbs: Vec<String>,
    pub middleware: Vec<MiddlewareRef>,
    pub hidden: bool,
    pub upload: Option<UploadLimit>,
}

impl HandlerMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route this handler at `route` exactly, ignoring any prefix.
    #[must_use]
    pub fn full_route(mut self, route: impl Into<String>) -> Self {
        self.full_route = Some(route.into());
        self
    }

    /// Use `name` instead of the handler's own name as its route segment.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name_override = Some(name.into());
        self
    }

    /// Accept a verb by name; unknown names fail route resolution.
    #[must_use]
    pub fn method(mut self, verb: impl Into<String>) -> Self {
        self.verbs.push(verb.into());
        self
    }

    #[must_use]
    pub fn all(self) -> Self {
        self.method("all")
    }

    #[must_use]
    pub fn get(self) -> Self {
        self.method("get")
    }

    #[must_use]
    pub fn post(self) -> Self {
        self.method("post")
    }

    #[must_use]
    pub fn put(self) -> Self {
        self.method("put")
    }

    #[must_use]
    pub fn delete(self) -> Self {
        self.method("delete")
    }

    #[must_use]
    pub fn patch(self) -> Self {
        self.method("patch")
    }

    #[must_use]
    pub fn options(self) -> Self {
        self.method("options")
    }

    #[must_use]
    pub fn head(self) -> Self {
        self.method("head")
    }

    /// Append a middleware after any standard or upload middleware.
    #[must_use]
    pub fn middleware(mut self, mw: MiddlewareRef) -> Self {
        self.middleware.push(mw);
        self
    }

    /// Never route this handler.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Accept multipart uploads up to the configured default size.
    #[must_use]
    pub fn file_upload(mut self) -> Self {
        self.upload = Some(UploadLimit::Default);
        self
    }

    /// Accept multipart uploads up to `bytes`.
    #[must_use]
    pub fn file_upload_limit(mut self, bytes: u64) -> Self {
        self.upload = Some(UploadLimit::Bytes(bytes));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.full_route.is_none()
            && self.name_override.is_none()
            && self.verbs.is_empty()
            && self.middleware.is_empty()
            && !self.hidden
            && self.upload.is_none()
    }
}

impl fmt::Debug for HandlerMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let middleware: Vec<&str> = self.middleware.iter().map(|m| m.name()).collect();
        f.debug_struct("HandlerMetadata")
            .field("full_route", &self.full_route)
            .field("name_override", &self.name_override)
            .field("verbs", &self.verbs)
            .field("middleware", &middleware)
            .field("hidden", &self.hidden)
            .field("upload", &self.upload)
            .finish()
    }
}

/// Per-class annotation bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMetadata {
    pub full_route: Option<String>,
    pub name_override: Option<String>,
}

impl ClassMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `route` as the prefix of every method, ignoring the directory prefix.
    #[must_use]
    pub fn full_route(mut self, route: impl Into<String>) -> Self {
        self.full_route = Some(route.into());
        self
    }

    /// Use `name` as the class's route segment.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name_override = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.full_route.is_none() && self.name_override.is_none()
    }
}

/// Something carrying a single-use annotation bag.
pub trait Annotated {
    type Metadata: Default;

    fn annotations_mut(&mut self) -> &mut Self::Metadata;

    /// Take the annotations, leaving an empty bag. Nothing else on the owner
    /// is touched.
    fn extract(&mut self) -> Self::Metadata {
        std::mem::take(self.annotations_mut())
    }
}
