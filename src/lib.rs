//! Modpack - pack package directories into one importable file
//!
//! The build-time half walks directories into a [`Bundle`] and writes it
//! into a carrier template. The run-time half reads that text back and
//! serves imports from it through a [`Resolver`].
//!
//! # Architecture
//!
//! ```text
//! modpack-config/   - layout, dialect, hook policy, log phases
//! modpack-vfs/      - filesystem abstraction (native and in-memory)
//! modpack-core/     - keys, traversal, serialization, artifact reading
//! modpack-runtime/  - resolver, host trait, reference script host
//! modpack-cli/      - the `modpack` binary
//! ```
//!
//! # Quick Start
//!
//! ```
//! use modpack::{pack, load, ScriptHost};
//! use modpack::vfs::MemoryFileSystem;
//!
//! let fs = MemoryFileSystem::with_files([
//!     ("app/__init__.py", ""),
//!     ("app/greet.py", "def hi(): return \"hi\""),
//! ]);
//! let packed = pack(&fs, &["app"]).unwrap();
//!
//! let resolver = load(&packed.text, ScriptHost::new()).unwrap();
//! let greet = resolver.import("app.greet").unwrap();
//! assert_eq!(resolver.host().call(&greet, "hi").unwrap().to_string(), "hi");
//! ```

pub use modpack_config as config;
pub use modpack_core as core;
pub use modpack_runtime as runtime;
pub use modpack_vfs as vfs;

pub use modpack_config::{Dialect, HookPolicy, Layout, PackConfig};
pub use modpack_core::{
    read_artifact, ArtifactError, Bundle, Carrier, LogicalKey, ModuleKind, PackError, Packed,
    Packer,
};
pub use modpack_runtime::{ExternalSource, Host, ModuleState, ResolveError, Resolver, ScriptHost};

use modpack_vfs::VirtualFileSystem;
use std::path::Path;

/// Pack `roots` with the default configuration
pub fn pack<P: AsRef<Path>>(vfs: &dyn VirtualFileSystem, roots: &[P]) -> Result<Packed, PackError> {
    Packer::new(vfs).pack(roots)
}

/// Read an artifact written with the default layout and dialect
pub fn load<H: Host>(text: &str, host: H) -> Result<Resolver<H>, ArtifactError> {
    modpack_runtime::load_artifact(text, &Layout::default(), &Dialect::default(), host)
}
