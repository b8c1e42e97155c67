//! Resolver error types

use modpack_core::{KeyError, LogicalKey};
use thiserror::Error;

/// Error returned by [`Resolver`](crate::Resolver) imports
///
/// `E` is the host's own error type.
#[derive(Error, Debug)]
pub enum ResolveError<E>
where
    E: std::error::Error + 'static,
{
    /// Neither the bundle nor the host knows the module
    #[error("No module named '{0}'")]
    NotFound(LogicalKey),

    /// The registry names a source the source table lacks
    #[error("bundle has no source '{source_key}' for module '{name}'")]
    MissingSource {
        name: LogicalKey,
        source_key: LogicalKey,
    },

    #[error("error while executing '{name}': {source}")]
    Execution {
        name: LogicalKey,
        #[source]
        source: E,
    },

    /// The host's own resolution failed
    #[error("host resolution failed: {0}")]
    Host(#[source] E),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("attempted relative import beyond top-level package '{anchor}'")]
    BeyondTopLevel { anchor: LogicalKey },

    #[error("attempted relative import with no known parent package in '{anchor}'")]
    NoParentPackage { anchor: LogicalKey },
}

impl<E> ResolveError<E>
where
    E: std::error::Error + 'static,
{
    /// True when the module simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }
}
