//! Key canonicalization: filesystem path -> logical keys
//!
//! A package's marker file yields two keys. The *source* key keeps the
//! marker segment (`app.__init__`), the *registry* key drops it (`app`).
//! Keeping them apart lets a package and a same-named submodule coexist.

use crate::bundle::ModuleKind;
use crate::key::{KeyError, LogicalKey};
use modpack_config::Layout;
use std::path::{Component, Path};

/// Keys derived from one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalKeys {
    pub kind: ModuleKind,
    /// Key under which the source text is stored
    pub source_key: LogicalKey,
    /// Import-visible key
    pub registry_key: LogicalKey,
}

/// Maps relative source paths to logical keys
#[derive(Debug, Clone)]
pub struct Canonicalizer<'a> {
    layout: &'a Layout,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Canonicalize a path relative to the directory holding the root package
    ///
    /// ```
    /// use modpack_config::Layout;
    /// use modpack_core::canon::Canonicalizer;
    /// use std::path::Path;
    ///
    /// let layout = Layout::default();
    /// let keys = Canonicalizer::new(&layout)
    ///     .canonicalize(Path::new("app/__init__.py"))
    ///     .unwrap();
    /// assert_eq!(keys.source_key.to_string(), "app.__init__");
    /// assert_eq!(keys.registry_key.to_string(), "app");
    /// ```
    pub fn canonicalize(&self, relative: &Path) -> Result<CanonicalKeys, KeyError> {
        let display = relative.to_string_lossy().to_string();
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part
                        .to_str()
                        .ok_or_else(|| KeyError::InvalidSegment(display.clone()))?;
                    segments.push(part.to_string());
                }
                Component::CurDir => {}
                _ => return Err(KeyError::InvalidSegment(display)),
            }
        }

        let last = segments.pop().ok_or(KeyError::Empty)?;
        let stem = self
            .layout
            .source_stem(&last)
            .ok_or_else(|| KeyError::InvalidSegment(display.clone()))?;
        segments.push(stem.to_string());

        let source_key = LogicalKey::parse(&segments.join("."))?;

        if stem == self.layout.marker_stem {
            let registry_key = source_key
                .parent()
                .ok_or(KeyError::InvalidSegment(display))?;
            Ok(CanonicalKeys {
                kind: ModuleKind::Package,
                source_key,
                registry_key,
            })
        } else {
            Ok(CanonicalKeys {
                kind: ModuleKind::Module,
                registry_key: source_key.clone(),
                source_key,
            })
        }
    }

    /// Source key for a registry key of the given kind
    pub fn source_key_for(
        &self,
        registry_key: &LogicalKey,
        kind: ModuleKind,
    ) -> Result<LogicalKey, KeyError> {
        source_key_for(registry_key, kind, &self.layout.marker_stem)
    }
}

/// Source key for a registry key, given the marker stem
pub fn source_key_for(
    registry_key: &LogicalKey,
    kind: ModuleKind,
    marker: &str,
) -> Result<LogicalKey, KeyError> {
    match kind {
        ModuleKind::Module => Ok(registry_key.clone()),
        ModuleKind::Package => registry_key.child(marker),
    }
}
