//! VirtualFileSystem trait definition

use crate::error::{VfsError, VfsResult};
use std::path::{Path, PathBuf};

/// Virtual File System trait
///
/// Provides a unified interface for file operations, decoupling the packer
/// and hosts from specific file system implementations.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Read file contents as UTF-8 text
    fn read_to_string(&self, path: &Path) -> VfsResult<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|e| VfsError::NotUtf8 {
            path: path.display().to_string(),
            offset: e.utf8_error().valid_up_to(),
        })
    }

    /// Write file contents
    ///
    /// Creates the file if it doesn't exist, truncates it if it does.
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// List the direct children of a directory
    ///
    /// Entries are returned as full paths (`path` joined with the entry
    /// name), in the backend's enumeration order.
    fn read_dir(&self, path: &Path) -> VfsResult<Vec<PathBuf>>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path exists and is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;
}
