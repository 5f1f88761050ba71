//! Route module descriptors and their classification.
//!
//! # Responsibilities
//! - Describe what a route file exports: a class, a lone function, a plain
//!   set of handlers, or a namespace of those
//! - Flatten one file's export into route units for the builder
//!
//! # Design Decisions
//! - A route file registers one factory returning a `ModuleExport`; the shape
//!   is explicit in the enum instead of being sniffed at load time
//! - Class inheritance is an explicit, ordered method list

use std::path::{Path, PathBuf};

use crate::discovery::metadata::{Annotated, ClassMetadata, HandlerMetadata};
use crate::discovery::source::RouteSource;
use crate::error::SetupError;
use crate::http::handler::BoundHandler;

/// One candidate handler with its annotations.
#[derive(Debug, Clone)]
pub struct HandlerSpec {
    name: String,
    meta: HandlerMetadata,
    handler: BoundHandler,
}

impl HandlerSpec {
    pub fn new(name: impl Into<String>, handler: BoundHandler) -> Self {
        Self {
            name: name.into(),
            meta: HandlerMetadata::default(),
            handler,
        }
    }

    #[must_use]
    pub fn meta(mut self, meta: HandlerMetadata) -> Self {
        self.meta = meta;
        self
    }

    /// The handler's own declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &BoundHandler {
        &self.handler
    }
}

impl Annotated for HandlerSpec {
    type Metadata = HandlerMetadata;

    fn annotations_mut(&mut self) -> &mut HandlerMetadata {
        &mut self.meta
    }
}

/// A class-like route owner: a type name, class annotations and its methods.
#[derive(Debug, Clone)]
pub struct ClassSpec {
    type_name: String,
    meta: ClassMetadata,
    methods: Vec<HandlerSpec>,
}

impl ClassSpec {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            meta: ClassMetadata::default(),
            methods: Vec::new(),
        }
    }

    /// Named after `T`, without its module path or generic arguments.
    pub fn for_type<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        let name = base.rsplit("::").next().unwrap_or(base);
        Self::new(name)
    }

    #[must_use]
    pub fn meta(mut self, meta: ClassMetadata) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn method(mut self, method: HandlerSpec) -> Self {
        self.methods.push(method);
        self
    }

    /// Append `base`'s methods that this class does not define itself.
    #[must_use]
    pub fn inherit(mut self, base: ClassSpec) -> Self {
        for method in base.methods {
            if !self.methods.iter().any(|m| m.name == method.name) {
                self.methods.push(method);
            }
        }
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn methods(&self) -> &[HandlerSpec] {
        &self.methods
    }

    pub(crate) fn into_methods(self) -> Vec<HandlerSpec> {
        self.methods
    }
}

impl Annotated for ClassSpec {
    type Metadata = ClassMetadata;

    fn annotations_mut(&mut self) -> &mut ClassMetadata {
        &mut self.meta
    }
}

/// What one route file exports.
#[derive(Debug, Clone)]
pub enum ModuleExport {
    Class(ClassSpec),
    /// A lone handler, routed as the file's index.
    Function(HandlerSpec),
    /// A plain set of handlers routed under the file's name.
    Object(Vec<HandlerSpec>),
    /// Named members, each classified as if it were the file's export.
    Namespace(Vec<(String, ModuleExport)>),
}

impl ModuleExport {
    fn kind(&self) -> &'static str {
        match self {
            ModuleExport::Class(_) => "class",
            ModuleExport::Function(_) => "function",
            ModuleExport::Object(_) => "object",
            ModuleExport::Namespace(_) => "namespace",
        }
    }
}

/// A classified unit handed to the route builder.
#[derive(Debug, Clone)]
pub enum UnitShape {
    Class(ClassSpec),
    Function(HandlerSpec),
    Object(Vec<HandlerSpec>),
}

#[derive(Debug, Clone)]
pub struct RouteUnit {
    /// Source file the unit came from.
    pub file: PathBuf,
    /// Lower-cased file stem, the route segment used when nothing overrides it.
    pub fallback_name: String,
    /// Where in the file the unit sits, for diagnostics.
    pub label: String,
    pub shape: UnitShape,
}

/// Loads a route file and classifies its export.
pub struct ModuleLoader;

impl ModuleLoader {
    pub fn load(source: &dyn RouteSource, file: &Path) -> Result<Vec<RouteUnit>, SetupError> {
        let export = source.load_module(file)?;
        tracing::debug!(file = %file.display(), kind = export.kind(), "Loaded route module");
        Self::classify(file, export)
    }

    pub fn classify(file: &Path, export: ModuleExport) -> Result<Vec<RouteUnit>, SetupError> {
        let fallback_name = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let unit = |label: String, shape: UnitShape| RouteUnit {
            file: file.to_path_buf(),
            fallback_name: fallback_name.clone(),
            label,
            shape,
        };

        match export {
            ModuleExport::Namespace(members) => {
                if members.is_empty() {
                    return Err(unsupported(file, "namespace has no members"));
                }
                let mut units = Vec::with_capacity(members.len());
                for (key, member) in members {
                    let shape = Self::single(file, member).map_err(|e| match e {
                        SetupError::UnsupportedExport { file, detail } => {
                            SetupError::UnsupportedExport {
                                file,
                                detail: format!("member `{}`: {}", key, detail),
                            }
                        }
                        other => other,
                    })?;
                    units.push(unit(key, shape));
                }
                Ok(units)
            }
            other => {
                let label = other.kind().to_string();
                Ok(vec![unit(label, Self::single(file, other)?)])
            }
        }
    }

    fn single(file: &Path, export: ModuleExport) -> Result<UnitShape, SetupError> {
        match export {
            ModuleExport::Class(class) => Ok(UnitShape::Class(class)),
            ModuleExport::Function(handler) => Ok(UnitShape::Function(handler)),
            ModuleExport::Object(handlers) if handlers.is_empty() => {
                Err(unsupported(file, "object exports no handlers"))
            }
            ModuleExport::Object(handlers) => Ok(UnitShape::Object(handlers)),
            ModuleExport::Namespace(_) => Err(unsupported(file, "nested namespaces are not supported")),
        }
    }
}

fn unsupported(file: &Path, detail: &str) -> SetupError {
    SetupError::UnsupportedExport {
        file: file.to_path_buf(),
        detail: detail.to_string(),
    }
}
