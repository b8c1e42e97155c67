//! Test helpers
//!
//! Shared fixtures for the end-to-end tests.

#![allow(dead_code)]

use modpack::core::{Registry, SourceTable};
use modpack::vfs::{MemoryFileSystem, VirtualFileSystem};
use modpack::{load, pack, Bundle, HookPolicy, Packed, Resolver, ScriptHost};
use std::sync::Arc;

/// The two-file tree used throughout the docs
pub const GREET_TREE: [(&str, &str); 2] = [
    ("app/__init__.py", ""),
    ("app/greet.py", "def hi(): return \"hi\"\n"),
];

/// Build an in-memory tree from `(path, content)` pairs
pub fn tree(files: &[(&str, &str)]) -> MemoryFileSystem {
    MemoryFileSystem::with_files(files.iter().copied())
}

/// Pack `roots` out of `files` with the default configuration
pub fn pack_tree(files: &[(&str, &str)], roots: &[&str]) -> Packed {
    let fs = tree(files);
    pack(&fs, roots).unwrap_or_else(|e| panic!("packing {:?} failed: {}", roots, e))
}

/// Pack and load the artifact text back into a fresh resolver
pub fn resolver_for(files: &[(&str, &str)], roots: &[&str]) -> Resolver<ScriptHost> {
    let packed = pack_tree(files, roots);
    load(&packed.text, ScriptHost::new()).unwrap_or_else(|e| panic!("reading artifact failed: {}", e))
}

/// A resolver with an empty bundle that executes `files` straight from
/// the tree under `root`
pub fn direct_resolver(files: &[(&str, &str)], root: &str) -> Resolver<ScriptHost> {
    let fs: Arc<dyn VirtualFileSystem> = Arc::new(tree(files));
    let bundle = Bundle {
        sources: SourceTable::new(),
        registry: Registry::new(),
        default_package: None,
        hook: HookPolicy::Disable,
        marker: "__init__".to_string(),
    };
    Resolver::new(bundle, ScriptHost::new().with_search_root(fs, root))
}
