//! Modpack Core - build-time half of modpack
//!
//! Walks package directories, derives the dual source/registry keys,
//! serializes the embedded tables into a carrier template and reads
//! artifacts back into a [`Bundle`].
//!
//! # Example
//! ```
//! use modpack_config::{Dialect, Layout};
//! use modpack_core::{read_artifact, LogicalKey, Packer};
//! use modpack_vfs::MemoryFileSystem;
//!
//! let fs = MemoryFileSystem::with_files([("app/__init__.py", "x = 1")]);
//! let packed = Packer::new(&fs).pack(&["app"]).unwrap();
//!
//! let bundle = read_artifact(&packed.text, &Layout::default(), &Dialect::default()).unwrap();
//! let app = LogicalKey::parse("app").unwrap();
//! assert_eq!(bundle.default_package, Some(app));
//! ```

pub mod artifact;
pub mod bundle;
pub mod canon;
pub mod carrier;
pub mod classify;
pub mod error;
pub mod graph;
pub mod key;
pub mod packer;
pub mod serialize;

pub use artifact::read_artifact;
pub use bundle::{Bundle, ModuleKind, Registry, RegistryEntry, SourceEntry, SourceTable};
pub use canon::{CanonicalKeys, Canonicalizer};
pub use carrier::Carrier;
pub use classify::{EntryClass, IgnoreReason, PathClassifier};
pub use error::{ArtifactError, BundleError, CarrierError, PackError};
pub use graph::{ModuleGraph, ModuleGraphBuilder, PackRecord, SourceUnit};
pub use key::{KeyError, LogicalKey};
pub use packer::{Packed, Packer};
pub use serialize::TableSerializer;
