//! VFS error types

use std::path::Path;
use thiserror::Error;

/// Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

/// Error type for VFS operations
///
/// Paths are stored as display strings so the error stays `Clone` and
/// comparable in tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VfsError {
    #[error("path not found: {path}")]
    NotFound { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// File content is not UTF-8 text
    #[error("'{path}' is not valid UTF-8 (first bad byte at offset {offset})")]
    NotUtf8 { path: String, offset: usize },

    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },

    #[error("file table lock poisoned")]
    LockPoisoned,
}

impl VfsError {
    /// Map an `std::io::Error` raised for `path`
    pub fn from_io(err: std::io::Error, path: &Path) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            std::io::ErrorKind::NotFound => VfsError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => VfsError::PermissionDenied { path },
            _ => VfsError::Io {
                path,
                message: err.to_string(),
            },
        }
    }

    /// Whether the path simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_from_io_kinds() {
        let path = Path::new("app/greet.py");
        let missing = VfsError::from_io(io::Error::new(io::ErrorKind::NotFound, "gone"), path);
        assert!(missing.is_not_found());

        let denied = VfsError::from_io(io::Error::new(io::ErrorKind::PermissionDenied, "no"), path);
        assert_eq!(
            denied,
            VfsError::PermissionDenied {
                path: "app/greet.py".to_string()
            }
        );

        let other = VfsError::from_io(io::Error::new(io::ErrorKind::Other, "disk on fire"), path);
        assert_eq!(other.to_string(), "I/O error on 'app/greet.py': disk on fire");
    }
}
