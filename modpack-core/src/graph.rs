//! Module graph building: walk package directories into ordered records

use crate::bundle::{Bundle, ModuleKind, Registry, RegistryEntry, SourceTable};
use crate::canon::Canonicalizer;
use crate::classify::{EntryClass, PathClassifier};
use crate::error::PackError;
use crate::key::LogicalKey;
use modpack_config::{HookPolicy, IgnoredEntries, PackConfig};
use modpack_vfs::VirtualFileSystem;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One physical source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub source: String,
}

/// One discovered module or package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackRecord {
    pub kind: ModuleKind,
    pub registry_key: LogicalKey,
    pub source_key: LogicalKey,
    pub unit: SourceUnit,
}

/// Ordered result of walking every root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleGraph {
    pub records: Vec<PackRecord>,
    /// Root package keys, in the order they were added
    pub roots: Vec<LogicalKey>,
}

impl ModuleGraph {
    /// Move the records into bundle tables
    pub fn into_bundle(
        self,
        default_package: Option<LogicalKey>,
        hook: HookPolicy,
        marker: &str,
    ) -> Result<Bundle, PackError> {
        let mut sources = SourceTable::new();
        let mut registry = Registry::new();
        let mut registry_paths: HashMap<LogicalKey, PathBuf> = HashMap::new();

        for record in self.records {
            let PackRecord {
                kind,
                registry_key,
                source_key,
                unit,
            } = record;

            if let Err(key) =
                sources.insert_with_origin(source_key, unit.source, Some(unit.path.clone()))
            {
                let first = sources
                    .entry(&key)
                    .and_then(|entry| entry.origin.clone())
                    .unwrap_or_default();
                return Err(PackError::DuplicateKey {
                    key,
                    first,
                    second: unit.path,
                });
            }
            if let Err(entry) = registry.insert(RegistryEntry::new(registry_key.clone(), kind)) {
                let first = registry_paths.remove(&entry.key).unwrap_or_default();
                return Err(PackError::DuplicateKey {
                    key: entry.key,
                    first,
                    second: unit.path,
                });
            }
            registry_paths.insert(registry_key, unit.path);
        }

        Ok(Bundle {
            sources,
            registry,
            default_package,
            hook,
            marker: marker.to_string(),
        })
    }
}

/// Walks package directories through a [`VirtualFileSystem`]
///
/// Entries of a directory are visited in name order. Sub-packages are
/// walked before the enclosing package's marker file is emitted.
pub struct ModuleGraphBuilder<'a> {
    vfs: &'a dyn VirtualFileSystem,
    config: &'a PackConfig,
    graph: ModuleGraph,
    source_paths: HashMap<LogicalKey, PathBuf>,
    registry_paths: HashMap<LogicalKey, PathBuf>,
}

impl<'a> ModuleGraphBuilder<'a> {
    pub fn new(vfs: &'a dyn VirtualFileSystem, config: &'a PackConfig) -> Self {
        Self {
            vfs,
            config,
            graph: ModuleGraph::default(),
            source_paths: HashMap::new(),
            registry_paths: HashMap::new(),
        }
    }

    /// Walk one root package directory
    ///
    /// Keys are relative to the directory holding `root`, so `src/app`
    /// produces keys starting with `app`.
    pub fn add_root(&mut self, root: &Path) -> Result<&mut Self, PackError> {
        let classifier = PathClassifier::new(self.vfs, &self.config.layout);
        let name = match classifier.classify(root) {
            EntryClass::Package { name, .. } => name,
            _ => {
                return Err(PackError::NotAPackage {
                    path: root.to_path_buf(),
                })
            }
        };

        info!(target: "modpack::walk", root = %root.display(), "Walking package");

        let base = root.parent().unwrap_or_else(|| Path::new(""));
        self.walk_directory(base, Path::new(&name))?;

        let key = LogicalKey::segment(&name).map_err(|source| PackError::Key {
            path: root.to_path_buf(),
            source,
        })?;
        self.graph.roots.push(key);
        Ok(self)
    }

    pub fn finish(self) -> ModuleGraph {
        self.graph
    }

    fn walk_directory(&mut self, base: &Path, relative: &Path) -> Result<(), PackError> {
        let dir = base.join(relative);
        let mut entries = self
            .vfs
            .read_dir(&dir)
            .map_err(|source| PackError::Read {
                path: dir.clone(),
                source,
            })?;
        entries.sort();

        let config = self.config;
        let marker = config.layout.marker_file_name();
        let classifier = PathClassifier::new(self.vfs, &config.layout);

        for entry in entries {
            let Some(name) = entry.file_name() else {
                continue;
            };
            if name == marker.as_str() {
                continue;
            }

            match classifier.classify(&entry) {
                EntryClass::Module { .. } => self.add_file(base, &relative.join(name))?,
                EntryClass::Package { .. } => self.walk_directory(base, &relative.join(name))?,
                EntryClass::Ignored(reason) => match config.ignored {
                    IgnoredEntries::Warn => {
                        warn!(target: "modpack::walk", path = %entry.display(), %reason, "Ignoring entry")
                    }
                    IgnoredEntries::Silent => {
                        debug!(target: "modpack::walk", path = %entry.display(), %reason, "Ignoring entry")
                    }
                },
            }
        }

        self.add_file(base, &relative.join(&marker))
    }

    fn add_file(&mut self, base: &Path, relative: &Path) -> Result<(), PackError> {
        let path = base.join(relative);
        let keys = Canonicalizer::new(&self.config.layout)
            .canonicalize(relative)
            .map_err(|source| PackError::Key {
                path: path.clone(),
                source,
            })?;

        if let Some(first) = self.source_paths.get(&keys.source_key) {
            return Err(PackError::DuplicateKey {
                key: keys.source_key,
                first: first.clone(),
                second: path,
            });
        }
        if let Some(first) = self.registry_paths.get(&keys.registry_key) {
            return Err(PackError::DuplicateKey {
                key: keys.registry_key,
                first: first.clone(),
                second: path,
            });
        }

        let source = self
            .vfs
            .read_to_string(&path)
            .map_err(|source| PackError::Read {
                path: path.clone(),
                source,
            })?;

        debug!(target: "modpack::walk", path = %path.display(), key = %keys.registry_key, "Processing file");

        self.source_paths
            .insert(keys.source_key.clone(), path.clone());
        self.registry_paths
            .insert(keys.registry_key.clone(), path.clone());
        self.graph.records.push(PackRecord {
            kind: keys.kind,
            registry_key: keys.registry_key,
            source_key: keys.source_key,
            unit: SourceUnit { path, source },
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modpack_vfs::{MemoryFileSystem, VfsError};

    fn walk(fs: &MemoryFileSystem, roots: &[&str]) -> Result<ModuleGraph, PackError> {
        let config = PackConfig::default();
        let mut builder = ModuleGraphBuilder::new(fs, &config);
        for root in roots {
            builder.add_root(Path::new(root))?;
        }
        Ok(builder.finish())
    }

    fn registry_keys(graph: &ModuleGraph) -> Vec<String> {
        graph
            .records
            .iter()
            .map(|r| r.registry_key.to_string())
            .collect()
    }

    #[test]
    fn test_single_package() {
        let fs = MemoryFileSystem::with_files([
            ("app/__init__.py", ""),
            ("app/greet.py", "def hi(): return \"hi\""),
        ]);
        let graph = walk(&fs, &["app"]).unwrap();

        assert_eq!(registry_keys(&graph), ["app.greet", "app"]);
        assert_eq!(graph.roots, [LogicalKey::parse("app").unwrap()]);

        let package = &graph.records[1];
        assert_eq!(package.kind, ModuleKind::Package);
        assert_eq!(package.source_key.to_string(), "app.__init__");
        assert_eq!(package.unit.path, PathBuf::from("app/__init__.py"));
    }

    #[test]
    fn test_nested_packages_recurse_before_marker() {
        let fs = MemoryFileSystem::with_files([
            ("app/__init__.py", ""),
            ("app/b.py", ""),
            ("app/sub/__init__.py", ""),
            ("app/sub/deep.py", ""),
            ("app/a.py", ""),
        ]);
        let graph = walk(&fs, &["app"]).unwrap();

        assert_eq!(
            registry_keys(&graph),
            ["app.a", "app.b", "app.sub.deep", "app.sub", "app"]
        );
    }

    #[test]
    fn test_ignored_entries_are_skipped() {
        let fs = MemoryFileSystem::with_files([
            ("app/__init__.py", ""),
            ("app/README.md", ""),
            ("app/assets/logo.png", ""),
            ("app/my-script.py", ""),
        ]);
        let graph = walk(&fs, &["app"]).unwrap();
        assert_eq!(registry_keys(&graph), ["app"]);
    }

    #[test]
    fn test_root_under_directory() {
        let fs = MemoryFileSystem::with_files([("src/app/__init__.py", ""), ("src/app/x.py", "")]);
        let graph = walk(&fs, &["src/app"]).unwrap();

        assert_eq!(registry_keys(&graph), ["app.x", "app"]);
        assert_eq!(graph.records[0].unit.path, PathBuf::from("src/app/x.py"));
    }

    #[test]
    fn test_not_a_package() {
        let fs = MemoryFileSystem::with_files([("lib/x.py", "")]);
        assert!(matches!(
            walk(&fs, &["lib"]),
            Err(PackError::NotAPackage { .. })
        ));
        assert!(matches!(
            walk(&fs, &["missing"]),
            Err(PackError::NotAPackage { .. })
        ));
    }

    #[test]
    fn test_duplicate_roots() {
        let fs = MemoryFileSystem::with_files([("one/app/__init__.py", ""), ("two/app/__init__.py", "")]);
        match walk(&fs, &["one/app", "two/app"]) {
            Err(PackError::DuplicateKey { key, first, second }) => {
                assert_eq!(key.to_string(), "app.__init__");
                assert_eq!(first, PathBuf::from("one/app/__init__.py"));
                assert_eq!(second, PathBuf::from("two/app/__init__.py"));
            }
            other => panic!("expected duplicate key, got {:?}", other),
        }
    }

    #[test]
    fn test_module_and_package_with_same_name() {
        let fs = MemoryFileSystem::with_files([
            ("app/__init__.py", ""),
            ("app/sub.py", ""),
            ("app/sub/__init__.py", ""),
        ]);
        assert!(matches!(
            walk(&fs, &["app"]),
            Err(PackError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_aborts() {
        let fs = MemoryFileSystem::with_files([
            ("app/__init__.py", b"".to_vec()),
            ("app/bad.py", vec![0xff, 0xfe]),
        ]);
        match walk(&fs, &["app"]) {
            Err(PackError::Read { path, source }) => {
                assert_eq!(path, PathBuf::from("app/bad.py"));
                assert!(matches!(source, VfsError::NotUtf8 { .. }));
            }
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_bundle() {
        let fs = MemoryFileSystem::with_files([("app/__init__.py", "x = 1"), ("app/greet.py", "")]);
        let graph = walk(&fs, &["app"]).unwrap();
        let bundle = graph
            .into_bundle(LogicalKey::parse("app").ok(), HookPolicy::Auto, "__init__")
            .unwrap();

        assert_eq!(bundle.registry.len(), 2);
        assert_eq!(
            bundle.sources.get(&LogicalKey::parse("app.__init__").unwrap()),
            Some("x = 1")
        );
        assert!(bundle.verify().is_ok());
    }

    fn record(kind: ModuleKind, registry: &str, source: &str, path: &str) -> PackRecord {
        PackRecord {
            kind,
            registry_key: LogicalKey::parse(registry).unwrap(),
            source_key: LogicalKey::parse(source).unwrap(),
            unit: SourceUnit {
                path: PathBuf::from(path),
                source: String::new(),
            },
        }
    }

    #[test]
    fn test_into_bundle_reports_both_paths() {
        let graph = ModuleGraph {
            records: vec![
                record(ModuleKind::Module, "app.x", "app.x", "one/app/x.py"),
                record(ModuleKind::Module, "app.x", "app.x", "two/app/x.py"),
            ],
            roots: Vec::new(),
        };
        match graph.into_bundle(None, HookPolicy::Auto, "__init__") {
            Err(PackError::DuplicateKey { first, second, .. }) => {
                assert_eq!(first, PathBuf::from("one/app/x.py"));
                assert_eq!(second, PathBuf::from("two/app/x.py"));
            }
            other => panic!("expected duplicate key, got {:?}", other),
        }

        let graph = ModuleGraph {
            records: vec![
                record(ModuleKind::Package, "app.x", "app.x.__init__", "app/x/__init__.py"),
                record(ModuleKind::Module, "app.x", "app.x", "app/x.py"),
            ],
            roots: Vec::new(),
        };
        match graph.into_bundle(None, HookPolicy::Auto, "__init__") {
            Err(PackError::DuplicateKey { key, first, second }) => {
                assert_eq!(key.to_string(), "app.x");
                assert_eq!(first, PathBuf::from("app/x/__init__.py"));
                assert_eq!(second, PathBuf::from("app/x.py"));
            }
            other => panic!("expected duplicate key, got {:?}", other),
        }
    }
}
