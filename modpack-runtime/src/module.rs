//! Materialized modules

use modpack_core::{LogicalKey, ModuleKind};
use std::sync::Arc;

/// What a host needs to know to create a namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: LogicalKey,
    pub kind: ModuleKind,
    /// Set for packages: submodules are searched below this key
    pub search_path: Option<LogicalKey>,
    /// Source table key; `None` for modules the host resolved itself
    pub source_key: Option<LogicalKey>,
}

impl ModuleSpec {
    pub fn new(name: LogicalKey, kind: ModuleKind, source_key: Option<LogicalKey>) -> Self {
        let search_path = kind.is_package().then(|| name.clone());
        Self {
            name,
            kind,
            search_path,
            source_key,
        }
    }
}

/// A module with its host namespace
#[derive(Debug)]
pub struct Module<N> {
    spec: ModuleSpec,
    namespace: N,
}

/// Shared handle to a module; identity is `Arc::ptr_eq`
pub type ModuleRef<N> = Arc<Module<N>>;

impl<N> Module<N> {
    pub fn new(spec: ModuleSpec, namespace: N) -> Self {
        Self { spec, namespace }
    }

    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    pub fn name(&self) -> &LogicalKey {
        &self.spec.name
    }

    pub fn kind(&self) -> ModuleKind {
        self.spec.kind
    }

    pub fn is_package(&self) -> bool {
        self.spec.kind.is_package()
    }

    pub fn search_path(&self) -> Option<&LogicalKey> {
        self.spec.search_path.as_ref()
    }

    pub fn namespace(&self) -> &N {
        &self.namespace
    }

    /// Package that relative imports inside this module resolve against
    pub fn package(&self) -> Option<LogicalKey> {
        match &self.spec.search_path {
            Some(path) => Some(path.clone()),
            None => self.spec.name.parent(),
        }
    }
}

/// Resolution state of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Never requested and not in the bundle
    Unresolved,
    /// In the bundle, not yet requested
    Registered,
    /// Executing
    Loading,
    Loaded,
    /// Requested but not in the bundle
    NotFound,
}
