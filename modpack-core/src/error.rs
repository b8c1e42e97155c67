//! Error types for packing and artifact reading

use crate::key::{KeyError, LogicalKey};
use modpack_vfs::VfsError;
use std::path::PathBuf;
use thiserror::Error;

/// Main packing error type
///
/// Every variant is fatal: packing never produces a partial artifact.
#[derive(Error, Debug)]
pub enum PackError {
    #[error("{} is not a package", path.display())]
    NotAPackage { path: PathBuf },

    #[error("{name} is not a valid default package")]
    InvalidDefaultPackage { name: String },

    #[error("read failed [{}]: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("duplicate key '{key}': {} and {}", first.display(), second.display())]
    DuplicateKey {
        key: LogicalKey,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid module path [{}]: {source}", path.display())]
    Key {
        path: PathBuf,
        #[source]
        source: KeyError,
    },

    #[error("carrier error: {0}")]
    Carrier(#[from] CarrierError),

    #[error("inconsistent bundle: {0}")]
    Bundle(#[from] BundleError),

    #[error("formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Error type for carrier templates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CarrierError {
    #[error("placeholder '{0}' not found in carrier template")]
    MissingPlaceholder(&'static str),

    #[error("placeholder '{0}' appears more than once in carrier template")]
    DuplicatePlaceholder(&'static str),
}

/// Error type for bundle consistency checks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BundleError {
    #[error("registry entry '{key}' has no source under '{source_key}'")]
    MissingSource {
        key: LogicalKey,
        source_key: LogicalKey,
    },

    #[error("registry entry '{key}' names unknown parent package '{parent}'")]
    OrphanEntry { key: LogicalKey, parent: LogicalKey },

    #[error("default package '{0}' is not a packed root package")]
    UnknownDefault(LogicalKey),

    #[error("invalid key: {0}")]
    Key(#[from] KeyError),
}

/// Error type for reading an artifact back into a bundle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("table '{0}' not found in artifact")]
    MissingTable(String),

    #[error("line {line}: {source}")]
    Key {
        line: usize,
        #[source]
        source: KeyError,
    },
}
