//! Packer facade: roots in, artifact text out

use crate::bundle::Bundle;
use crate::carrier::Carrier;
use crate::classify::PathClassifier;
use crate::error::PackError;
use crate::graph::ModuleGraphBuilder;
use crate::key::LogicalKey;
use crate::serialize::TableSerializer;
use modpack_config::{HookPolicy, PackConfig};
use modpack_vfs::VirtualFileSystem;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of one packing run
#[derive(Debug, Clone)]
pub struct Packed {
    pub bundle: Bundle,
    pub text: String,
}

/// Packs root package directories into one artifact
///
/// # Example
/// ```
/// use modpack_core::Packer;
/// use modpack_vfs::MemoryFileSystem;
///
/// let fs = MemoryFileSystem::with_files([
///     ("app/__init__.py", ""),
///     ("app/greet.py", "def hi(): return \"hi\""),
/// ]);
/// let packed = Packer::new(&fs).pack(&["app"]).unwrap();
/// assert!(packed.text.contains("\"app.greet\": {\"is_package\": False"));
/// ```
pub struct Packer<'a> {
    vfs: &'a dyn VirtualFileSystem,
    config: PackConfig,
    carrier: Carrier,
    hook: HookPolicy,
    default_package: Option<String>,
}

impl<'a> Packer<'a> {
    pub fn new(vfs: &'a dyn VirtualFileSystem) -> Self {
        Self {
            vfs,
            config: PackConfig::default(),
            carrier: Carrier::default(),
            hook: HookPolicy::Auto,
            default_package: None,
        }
    }

    pub fn with_config(mut self, config: PackConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_carrier(mut self, carrier: Carrier) -> Self {
        self.carrier = carrier;
        self
    }

    pub fn with_hook(mut self, hook: HookPolicy) -> Self {
        self.hook = hook;
        self
    }

    /// Override the default package; accepts a given root path or its
    /// directory name
    pub fn with_default_package(mut self, default_package: Option<String>) -> Self {
        self.default_package = default_package;
        self
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Every root that is not a package directory
    pub fn invalid_roots<P: AsRef<Path>>(&self, roots: &[P]) -> Vec<PathBuf> {
        let classifier = PathClassifier::new(self.vfs, &self.config.layout);
        roots
            .iter()
            .map(|root| root.as_ref())
            .filter(|root| !classifier.is_package(root))
            .map(Path::to_path_buf)
            .collect()
    }

    /// Resolve the default package for the given roots
    ///
    /// Without an override a single root becomes the default and several
    /// roots leave it empty.
    pub fn default_package_for<P: AsRef<Path>>(&self, roots: &[P]) -> Result<Option<LogicalKey>, PackError> {
        match &self.default_package {
            Some(name) => {
                let wanted = Path::new(name);
                let found = roots.iter().map(|root| root.as_ref()).find(|root| {
                    root.components().eq(wanted.components())
                        || root.file_name().map(|n| n == name.as_str()).unwrap_or(false)
                });
                found
                    .and_then(root_key)
                    .map(Some)
                    .ok_or_else(|| PackError::InvalidDefaultPackage { name: name.clone() })
            }
            None if roots.len() == 1 => Ok(roots.first().and_then(|root| root_key(root.as_ref()))),
            None => Ok(None),
        }
    }

    /// Walk every root into a verified [`Bundle`]
    pub fn bundle<P: AsRef<Path>>(&self, roots: &[P]) -> Result<Bundle, PackError> {
        let default_package = self.default_package_for(roots)?;

        let mut builder = ModuleGraphBuilder::new(self.vfs, &self.config);
        for root in roots {
            builder.add_root(root.as_ref())?;
        }
        let graph = builder.finish();

        let bundle = graph.into_bundle(default_package, self.hook, &self.config.layout.marker_stem)?;
        bundle.verify()?;
        Ok(bundle)
    }

    /// Walk and serialize
    pub fn pack<P: AsRef<Path>>(&self, roots: &[P]) -> Result<Packed, PackError> {
        let bundle = self.bundle(roots)?;
        let text = TableSerializer::new(&self.config.dialect)
            .with_tagging(self.config.tagging)
            .serialize(&bundle, &self.carrier)?;

        info!(
            target: "modpack::emit",
            modules = bundle.registry.len(),
            default_package = ?bundle.default_package.as_ref().map(ToString::to_string),
            "Packed bundle"
        );
        Ok(Packed { bundle, text })
    }
}

fn root_key(root: &Path) -> Option<LogicalKey> {
    root.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| LogicalKey::segment(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ModuleKind;
    use modpack_vfs::MemoryFileSystem;

    fn two_roots() -> MemoryFileSystem {
        MemoryFileSystem::with_files([
            ("src/app/__init__.py", ""),
            ("src/app/greet.py", ""),
            ("lib/util/__init__.py", ""),
        ])
    }

    fn key(s: &str) -> LogicalKey {
        LogicalKey::parse(s).unwrap()
    }

    #[test]
    fn test_single_root_is_default() {
        let fs = two_roots();
        let bundle = Packer::new(&fs).bundle(&["src/app"]).unwrap();
        assert_eq!(bundle.default_package, Some(key("app")));
    }

    #[test]
    fn test_several_roots_have_no_default() {
        let fs = two_roots();
        let bundle = Packer::new(&fs).bundle(&["src/app", "lib/util"]).unwrap();
        assert_eq!(bundle.default_package, None);
        assert_eq!(bundle.roots().count(), 2);
    }

    #[test]
    fn test_default_override_by_path_or_name() {
        let fs = two_roots();
        for name in ["lib/util", "util"] {
            let bundle = Packer::new(&fs)
                .with_default_package(Some(name.to_string()))
                .bundle(&["src/app", "lib/util"])
                .unwrap();
            assert_eq!(bundle.default_package, Some(key("util")));
        }
    }

    #[test]
    fn test_invalid_default_override() {
        let fs = two_roots();
        let result = Packer::new(&fs)
            .with_default_package(Some("other".to_string()))
            .bundle(&["src/app"]);
        assert!(matches!(
            result,
            Err(PackError::InvalidDefaultPackage { name }) if name == "other"
        ));
    }

    #[test]
    fn test_invalid_roots_reports_all() {
        let fs = MemoryFileSystem::with_files([("app/__init__.py", ""), ("plain/x.py", "")]);
        let invalid = Packer::new(&fs).invalid_roots(&["app", "plain", "missing"]);
        assert_eq!(invalid, [PathBuf::from("plain"), PathBuf::from("missing")]);
    }

    #[test]
    fn test_disambiguation() {
        let fs = MemoryFileSystem::with_files([("pkg/__init__.py", "init"), ("pkg/sub.py", "sub")]);
        let bundle = Packer::new(&fs).bundle(&["pkg"]).unwrap();

        assert_eq!(bundle.registry.get(&key("pkg")).unwrap().kind, ModuleKind::Package);
        assert_eq!(bundle.registry.get(&key("pkg.sub")).unwrap().kind, ModuleKind::Module);
        assert_eq!(bundle.sources.get(&key("pkg.__init__")), Some("init"));
        assert_eq!(bundle.sources.get(&key("pkg.sub")), Some("sub"));
        assert!(!bundle.sources.contains(&key("pkg")));
    }

    #[test]
    fn test_pack_is_deterministic() {
        let fs = two_roots();
        let packer = Packer::new(&fs).with_hook(HookPolicy::Force);
        let first = packer.pack(&["src/app", "lib/util"]).unwrap().text;
        let second = packer.pack(&["src/app", "lib/util"]).unwrap().text;
        assert_eq!(first, second);
        assert!(first.contains("FORCE_EXC_HOOK = True"));
    }
}
