//! Host protocol: what a module system must provide to a resolver

use crate::module::{ModuleRef, ModuleSpec};
use crate::resolver::Resolver;
use modpack_core::{LogicalKey, ModuleKind};

/// A module the host found outside the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSource {
    pub kind: ModuleKind,
    pub source: String,
}

/// A target module system
///
/// The resolver owns caching, ordering and the bundle tables; the host
/// owns namespaces and executes source text in them. `execute` may call
/// back into the resolver to import other modules.
pub trait Host: Sized {
    type Namespace: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fresh, empty namespace for a module about to run
    fn create_namespace(&self, spec: &ModuleSpec) -> Self::Namespace;

    /// Run `source` inside `module`'s namespace
    fn execute(
        &self,
        resolver: &Resolver<Self>,
        module: &ModuleRef<Self::Namespace>,
        source: &str,
    ) -> Result<(), Self::Error>;

    /// Expose a loaded submodule as an attribute of its parent
    fn bind_submodule(
        &self,
        _parent: &ModuleRef<Self::Namespace>,
        _name: &str,
        _child: &ModuleRef<Self::Namespace>,
    ) {
    }

    /// The host's own lookup, consulted for keys outside the bundle
    ///
    /// Only finds the source; the resolver claims the key and executes it
    /// like a bundled module, so cycles through external modules terminate.
    fn find_external(&self, _name: &LogicalKey) -> Result<Option<ExternalSource>, Self::Error> {
        Ok(None)
    }

    /// Whether the host already reports uncaught errors itself
    fn has_error_hook(&self) -> bool {
        false
    }
}
