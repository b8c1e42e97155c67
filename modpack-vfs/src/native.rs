//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::path::{Path, PathBuf};

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access. Relative paths are resolved against
/// an optional base directory.
///
/// # Example
/// ```
/// use modpack_vfs::{NativeFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = NativeFileSystem::new();
/// assert!(!fs.is_file(Path::new("/definitely/not/here.py")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem {
    base: Option<PathBuf>,
}

impl NativeFileSystem {
    /// Create a new native file system rooted at the working directory.
    pub fn new() -> Self {
        Self { base: None }
    }

    /// Create a new native file system with a base directory.
    ///
    /// Relative paths are joined onto `base`; absolute paths are used as-is.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        std::fs::read(self.resolve(path)).map_err(|e| VfsError::from_io(e, path))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        std::fs::write(self.resolve(path), content).map_err(|e| VfsError::from_io(e, path))
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<PathBuf>> {
        let real = self.resolve(path);
        if real.is_file() {
            return Err(VfsError::NotADirectory {
                path: path.to_string_lossy().to_string(),
            });
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&real).map_err(|e| VfsError::from_io(e, path))? {
            let entry = entry.map_err(|e| VfsError::from_io(e, path))?;
            entries.push(path.join(entry.file_name()));
        }
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path).is_dir()
    }
}
