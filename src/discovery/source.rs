//! Where route files come from.
//!
//! # Responsibilities
//! - List directories and tell files from directories
//! - Resolve a route file to the export its module registered
//!
//! # Design Decisions
//! - Every call is synchronous and any failure is fatal to startup
//! - On disk, route files register a factory with `route_module!`; the
//!   registry matches a walked path against the registered `file!()` path
//!   by trailing components. Roots are absolute by the time they are walked,
//!   so the registered path is always the shorter side of the match
//! - `MemorySource` gives tests and embedders the same tree without a disk

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::discovery::module::ModuleExport;
use crate::error::SetupError;

/// Directory and module access used by the tree walker.
pub trait RouteSource {
    /// Entry names (not paths) directly inside `dir`.
    fn list_directory(&self, dir: &Path) -> Result<Vec<String>, SetupError>;

    fn is_directory(&self, path: &Path) -> Result<bool, SetupError>;

    /// The export of the route file at `path`.
    fn load_module(&self, path: &Path) -> Result<ModuleExport, SetupError>;
}

/// Builds a route file's export.
pub type ModuleFactory = fn() -> ModuleExport;

/// A route file's self-registration, collected with `inventory`.
pub struct ModuleRegistration {
    pub file: &'static str,
    pub factory: ModuleFactory,
}

impl ModuleRegistration {
    pub const fn new(file: &'static str, factory: ModuleFactory) -> Self {
        Self { file, factory }
    }
}

inventory::collect!(ModuleRegistration);

/// Route module factories keyed by source path.
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    entries: Vec<(PathBuf, ModuleFactory)>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every module registered in this binary with `route_module!`.
    pub fn collect() -> Self {
        let mut registry = Self::new();
        for reg in inventory::iter::<ModuleRegistration> {
            registry.register(reg.file, reg.factory);
        }
        tracing::debug!(modules = registry.len(), "Collected route module registrations");
        registry
    }

    pub fn register(&mut self, file: impl Into<PathBuf>, factory: ModuleFactory) {
        self.entries.push((normalize(&file.into()), factory));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The factory whose registered path is the longest suffix of `path`.
    /// A registration is never matched by a shorter walked path.
    pub fn lookup(&self, path: &Path) -> Option<ModuleFactory> {
        let path = normalize(path);
        self.entries
            .iter()
            .filter(|(file, _)| path.ends_with(file))
            .max_by_key(|(file, _)| file.components().count())
            .map(|(_, factory)| *factory)
    }
}

/// Drop `.` components so `./src/routes/a.rs` and `src/routes/a.rs` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Route files on the local filesystem.
pub struct FsSource {
    registry: ModuleRegistry,
}

impl FsSource {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self { registry }
    }
}

impl RouteSource for FsSource {
    fn list_directory(&self, dir: &Path) -> Result<Vec<String>, SetupError> {
        let entries = fs::read_dir(dir).map_err(|e| SetupError::io(dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SetupError::io(dir, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn is_directory(&self, path: &Path) -> Result<bool, SetupError> {
        fs::metadata(path)
            .map(|m| m.is_dir())
            .map_err(|e| SetupError::io(path, e))
    }

    fn load_module(&self, path: &Path) -> Result<ModuleExport, SetupError> {
        let factory = self
            .registry
            .lookup(path)
            .ok_or_else(|| SetupError::ModuleNotRegistered {
                file: path.to_path_buf(),
            })?;
        Ok(factory())
    }
}

type SharedFactory = Arc<dyn Fn() -> ModuleExport + Send + Sync>;

enum Entry {
    Dir,
    File(Option<SharedFactory>),
}

/// An in-memory route tree.
#[derive(Default)]
pub struct MemorySource {
    entries: BTreeMap<PathBuf, Entry>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route file; missing parent directories are created.
    #[must_use]
    pub fn module<F>(mut self, path: impl AsRef<Path>, factory: F) -> Self
    where
        F: Fn() -> ModuleExport + Send + Sync + 'static,
    {
        let path = path.as_ref();
        self.add_parents(path);
        self.entries
            .insert(path.to_path_buf(), Entry::File(Some(Arc::new(factory))));
        self
    }

    /// Add a file with no module behind it.
    #[must_use]
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.add_parents(path);
        self.entries.insert(path.to_path_buf(), Entry::File(None));
        self
    }

    /// Add an (empty) directory.
    #[must_use]
    pub fn dir(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.add_parents(path);
        self.entries.insert(path.to_path_buf(), Entry::Dir);
        self
    }

    fn add_parents(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.entries.insert(ancestor.to_path_buf(), Entry::Dir);
        }
    }

    fn not_found(path: &Path) -> SetupError {
        SetupError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        )
    }
}

impl RouteSource for MemorySource {
    fn list_directory(&self, dir: &Path) -> Result<Vec<String>, SetupError> {
        match self.entries.get(dir) {
            Some(Entry::Dir) => {}
            Some(Entry::File(_)) => {
                return Err(SetupError::io(
                    dir,
                    std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
                ))
            }
            None => return Err(Self::not_found(dir)),
        }
        Ok(self
            .entries
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect())
    }

    fn is_directory(&self, path: &Path) -> Result<bool, SetupError> {
        match self.entries.get(path) {
            Some(entry) => Ok(matches!(entry, Entry::Dir)),
            None => Err(Self::not_found(path)),
        }
    }

    fn load_module(&self, path: &Path) -> Result<ModuleExport, SetupError> {
        match self.entries.get(path) {
            Some(Entry::File(Some(factory))) => Ok(factory()),
            Some(_) => Err(SetupError::ModuleNotRegistered {
                file: path.to_path_buf(),
            }),
            None => Err(Self::not_found(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::module::{ClassSpec, ModuleExport};

    fn sales() -> ModuleExport {
        ModuleExport::Class(ClassSpec::new("Sales"))
    }

    fn orders() -> ModuleExport {
        ModuleExport::Class(ClassSpec::new("Orders"))
    }

    fn type_name(export: ModuleExport) -> String {
        match export {
            ModuleExport::Class(c) => c.type_name().to_string(),
            other => panic!("unexpected export {other:?}"),
        }
    }

    #[test]
    fn test_registry_matches_by_suffix() {
        let mut registry = ModuleRegistry::new();
        registry.register("src/routes/api/sales.rs", sales);
        registry.register("src/routes/sales.rs", orders);

        let factory = registry
            .lookup(Path::new("/home/me/app/src/routes/api/sales.rs"))
            .unwrap();
        assert_eq!(type_name(factory()), "Sales");

        let factory = registry.lookup(Path::new("./src/routes/sales.rs")).unwrap();
        assert_eq!(type_name(factory()), "Orders");

        assert!(registry.lookup(Path::new("src/routes/other.rs")).is_none());
    }

    #[test]
    fn test_short_walked_path_does_not_guess() {
        let mut registry = ModuleRegistry::new();
        registry.register("src/routes/api/sales.rs", sales);
        registry.register("src/routes/sales.rs", orders);

        assert!(registry.lookup(Path::new("./sales.rs")).is_none());
        assert!(registry.lookup(Path::new("api/sales.rs")).is_none());

        let factory = registry
            .lookup(Path::new("/srv/app/src/routes/sales.rs"))
            .unwrap();
        assert_eq!(type_name(factory()), "Orders");
    }

    #[test]
    fn test_memory_source_tree() {
        let source = MemorySource::new()
            .module("/routes/a.rs", sales)
            .module("/routes/api/b.rs", orders)
            .file("/routes/README.md")
            .dir("/routes/empty");

        let mut names = source.list_directory(Path::new("/routes")).unwrap();
        names.sort();
        assert_eq!(names, vec!["README.md", "a.rs", "api", "empty"]);
        assert!(source.is_directory(Path::new("/routes/api")).unwrap());
        assert!(!source.is_directory(Path::new("/routes/a.rs")).unwrap());
        assert_eq!(type_name(source.load_module(Path::new("/routes/api/b.rs")).unwrap()), "Orders");
        assert!(matches!(
            source.load_module(Path::new("/routes/README.md")),
            Err(SetupError::ModuleNotRegistered { .. })
        ));
        assert!(matches!(
            source.list_directory(Path::new("/missing")),
            Err(SetupError::Io { .. })
        ));
    }
}
