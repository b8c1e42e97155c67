//! Path classification: module, package, or neither

use crate::key::is_segment;
use modpack_config::Layout;
use modpack_vfs::VirtualFileSystem;
use std::fmt;
use std::path::{Path, PathBuf};

/// Why a directory entry was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A file without the source extension
    NotSource,
    /// A directory without a package marker
    NoMarker,
    /// A name that cannot be a key segment (dots, dashes, spaces…)
    InvalidName,
    /// Neither a regular file nor a directory
    Special,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::NotSource => write!(f, "not a source file"),
            IgnoreReason::NoMarker => write!(f, "directory without package marker"),
            IgnoreReason::InvalidName => write!(f, "name is not a valid module identifier"),
            IgnoreReason::Special => write!(f, "neither file nor directory"),
        }
    }
}

/// Classification of one filesystem entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryClass {
    /// A source file; `stem` is its name without extension
    Module { stem: String },
    /// A directory holding the package marker
    Package { name: String, marker: PathBuf },
    Ignored(IgnoreReason),
}

/// Decides what a filesystem entry is
pub struct PathClassifier<'a> {
    vfs: &'a dyn VirtualFileSystem,
    layout: &'a Layout,
}

impl<'a> PathClassifier<'a> {
    pub fn new(vfs: &'a dyn VirtualFileSystem, layout: &'a Layout) -> Self {
        Self { vfs, layout }
    }

    pub fn classify(&self, path: &Path) -> EntryClass {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return EntryClass::Ignored(IgnoreReason::InvalidName),
        };

        if self.vfs.is_file(path) {
            return match self.layout.source_stem(name) {
                Some(stem) if is_segment(stem) => EntryClass::Module {
                    stem: stem.to_string(),
                },
                Some(_) => EntryClass::Ignored(IgnoreReason::InvalidName),
                None => EntryClass::Ignored(IgnoreReason::NotSource),
            };
        }

        if self.vfs.is_dir(path) {
            let marker = path.join(self.layout.marker_file_name());
            if !self.vfs.is_file(&marker) {
                return EntryClass::Ignored(IgnoreReason::NoMarker);
            }
            if !is_segment(name) {
                return EntryClass::Ignored(IgnoreReason::InvalidName);
            }
            return EntryClass::Package {
                name: name.to_string(),
                marker,
            };
        }

        EntryClass::Ignored(IgnoreReason::Special)
    }

    /// Check whether `path` is a package directory
    pub fn is_package(&self, path: &Path) -> bool {
        matches!(self.classify(path), EntryClass::Package { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modpack_vfs::MemoryFileSystem;

    fn tree() -> MemoryFileSystem {
        MemoryFileSystem::with_files([
            ("app/__init__.py", ""),
            ("app/greet.py", ""),
            ("app/notes.txt", ""),
            ("app/my-tool.py", ""),
            ("app/data/blob.bin", ""),
            ("app/sub/__init__.py", ""),
            ("app/bad-pkg/__init__.py", ""),
        ])
    }

    #[test]
    fn test_module() {
        let fs = tree();
        let layout = Layout::default();
        let classifier = PathClassifier::new(&fs, &layout);

        assert_eq!(
            classifier.classify(Path::new("app/greet.py")),
            EntryClass::Module {
                stem: "greet".to_string()
            }
        );
    }

    #[test]
    fn test_package() {
        let fs = tree();
        let layout = Layout::default();
        let classifier = PathClassifier::new(&fs, &layout);

        assert_eq!(
            classifier.classify(Path::new("app/sub")),
            EntryClass::Package {
                name: "sub".to_string(),
                marker: PathBuf::from("app/sub/__init__.py"),
            }
        );
        assert!(classifier.is_package(Path::new("app")));
    }

    #[test]
    fn test_ignored_entries() {
        let fs = tree();
        let layout = Layout::default();
        let classifier = PathClassifier::new(&fs, &layout);

        assert_eq!(
            classifier.classify(Path::new("app/notes.txt")),
            EntryClass::Ignored(IgnoreReason::NotSource)
        );
        assert_eq!(
            classifier.classify(Path::new("app/data")),
            EntryClass::Ignored(IgnoreReason::NoMarker)
        );
        assert_eq!(
            classifier.classify(Path::new("app/my-tool.py")),
            EntryClass::Ignored(IgnoreReason::InvalidName)
        );
        assert_eq!(
            classifier.classify(Path::new("app/bad-pkg")),
            EntryClass::Ignored(IgnoreReason::InvalidName)
        );
        assert_eq!(
            classifier.classify(Path::new("app/missing")),
            EntryClass::Ignored(IgnoreReason::Special)
        );
    }

    #[test]
    fn test_custom_layout() {
        let fs = MemoryFileSystem::with_files([("lib/mod.lua", ""), ("lib/init.lua", "")]);
        let layout = Layout {
            source_extension: "lua".to_string(),
            marker_stem: "init".to_string(),
        };
        let classifier = PathClassifier::new(&fs, &layout);

        assert!(classifier.is_package(Path::new("lib")));
        assert!(matches!(
            classifier.classify(Path::new("lib/mod.lua")),
            EntryClass::Module { .. }
        ));
    }
}
