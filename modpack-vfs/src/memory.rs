//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// An in-memory file system implementation.
///
/// Files are stored in a `BTreeMap` keyed by normalized path. Directories
/// are implicit: a directory exists as long as some file lives below it,
/// and `read_dir` enumerates children in sorted order.
///
/// # Example
/// ```
/// use modpack_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("app/greet.py"), b"def hi(): return \"hi\"").unwrap();
/// assert!(fs.is_dir(Path::new("app")));
/// assert_eq!(fs.read_dir(Path::new("app")).unwrap().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: Into<Vec<u8>>,
    {
        let fs = Self::new();
        if let Ok(mut map) = fs.files.write() {
            for (path, content) in files {
                map.insert(normalize(Path::new(path.as_ref())), content.into());
            }
        }
        fs
    }

    /// Number of stored files
    pub fn len(&self) -> usize {
        self.files.read().map(|files| files.len()).unwrap_or(0)
    }

    /// Check whether no file is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_poisoned() -> VfsError {
        VfsError::LockPoisoned
    }
}

/// Normalize a path for internal storage.
///
/// Uses forward slashes, drops `./` prefixes and trailing slashes.
fn normalize(path: &Path) -> String {
    let mut s = path.to_string_lossy().replace('\\', "/");
    while let Some(rest) = s.strip_prefix("./") {
        s = rest.to_string();
    }
    if s == "." {
        s.clear();
    }
    while s.len() > 1 && s.ends_with('/') {
        s.pop();
    }
    s
}

/// Prefix shared by every key stored below `dir`
fn dir_prefix(dir: &str) -> String {
    match dir {
        "" => String::new(),
        "/" => "/".to_string(),
        _ => format!("{}/", dir),
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = normalize(path);
        let files = self.files.read().map_err(|_| Self::lock_poisoned())?;

        files
            .get(&normalized)
            .cloned()
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = normalize(path);
        if normalized.is_empty() || normalized == "/" {
            return Err(VfsError::InvalidPath {
                path: normalized,
                reason: "cannot write to a directory root".to_string(),
            });
        }
        let mut files = self.files.write().map_err(|_| Self::lock_poisoned())?;
        files.insert(normalized, content.to_vec());
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<PathBuf>> {
        let normalized = normalize(path);
        let files = self.files.read().map_err(|_| Self::lock_poisoned())?;

        if files.contains_key(&normalized) {
            return Err(VfsError::NotADirectory { path: normalized });
        }

        let prefix = dir_prefix(&normalized);
        let children: BTreeSet<&str> = files
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| key[prefix.len()..].split('/').next())
            .filter(|child| !child.is_empty())
            .collect();

        if children.is_empty() {
            return Err(VfsError::NotFound { path: normalized });
        }

        Ok(children.into_iter().map(|child| path.join(child)).collect())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let normalized = normalize(path);
        match self.files.read() {
            Ok(files) => files.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let prefix = dir_prefix(&normalize(path));
        let files = match self.files.read() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        files
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .any(|(key, _)| key.len() > prefix.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn sample_tree() -> MemoryFileSystem {
        MemoryFileSystem::with_files([
            ("proj/app/__init__.py", ""),
            ("proj/app/greet.py", "def hi(): return \"hi\""),
            ("proj/app/sub/__init__.py", ""),
            ("proj/app/sub/deep.py", "X = 1"),
            ("proj/README.md", "# readme"),
        ])
    }

    #[test]
    fn test_new_fs_is_empty() {
        let fs = MemoryFileSystem::new();
        assert!(fs.is_empty());
        assert!(!fs.exists(Path::new("anything.py")));
    }

    #[test]
    fn test_write_and_read() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/test.py");

        fs.write_file(path, b"hello world").unwrap();

        assert_eq!(fs.read_file(path).unwrap(), b"hello world");
        assert_eq!(fs.read_to_string(path).unwrap(), "hello world");
    }

    #[test]
    fn test_read_nonexistent() {
        let fs = MemoryFileSystem::new();
        let result = fs.read_file(Path::new("/nonexistent.py"));

        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
    }

    #[test]
    fn test_invalid_utf8_text() {
        let fs = MemoryFileSystem::with_files([("bad.py", vec![0xff, 0xfe])]);
        let result = fs.read_to_string(Path::new("bad.py"));

        assert!(matches!(result.unwrap_err(), VfsError::NotUtf8 { offset: 0, .. }));
    }

    #[test]
    fn test_normalized_paths() {
        let fs = MemoryFileSystem::new();
        fs.write_file(Path::new("./app/x.py"), b"x").unwrap();

        assert!(fs.is_file(Path::new("app/x.py")));
        assert!(fs.is_dir(Path::new("app/")));
        assert!(fs.is_dir(Path::new("./app")));
    }

    #[test]
    fn test_directories_are_implicit() {
        let fs = sample_tree();

        assert!(fs.is_dir(Path::new("proj")));
        assert!(fs.is_dir(Path::new("proj/app/sub")));
        assert!(!fs.is_dir(Path::new("proj/app/greet.py")));
        assert!(!fs.is_dir(Path::new("proj/ap")));
        assert!(fs.exists(Path::new("proj/app")));
        assert!(!fs.is_file(Path::new("proj/app")));
    }

    #[test]
    fn test_read_dir_lists_direct_children_sorted() {
        let fs = sample_tree();

        let entries = fs.read_dir(Path::new("proj/app")).unwrap();
        assert_eq!(
            entries,
            vec![
                PathBuf::from("proj/app/__init__.py"),
                PathBuf::from("proj/app/greet.py"),
                PathBuf::from("proj/app/sub"),
            ]
        );
    }

    #[test]
    fn test_read_dir_relative_root() {
        let fs = sample_tree();

        let entries = fs.read_dir(Path::new("")).unwrap();
        assert_eq!(entries, vec![PathBuf::from("proj")]);
    }

    #[test]
    fn test_read_dir_on_file() {
        let fs = sample_tree();
        let result = fs.read_dir(Path::new("proj/README.md"));

        assert!(matches!(result.unwrap_err(), VfsError::NotADirectory { .. }));
    }

    #[test]
    fn test_read_dir_missing() {
        let fs = sample_tree();
        let result = fs.read_dir(Path::new("proj/missing"));

        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
    }

    #[test]
    fn test_write_to_root_rejected() {
        let fs = MemoryFileSystem::new();
        let result = fs.write_file(Path::new("/"), b"x");

        assert!(matches!(result.unwrap_err(), VfsError::InvalidPath { .. }));
    }

    #[test]
    fn test_clone_shares_data() {
        let fs1 = MemoryFileSystem::new();
        let path = Path::new("/shared.py");

        fs1.write_file(path, b"shared").unwrap();

        let fs2 = fs1.clone();
        assert_eq!(fs2.read_file(path).unwrap(), b"shared");

        fs2.write_file(path, b"modified").unwrap();
        assert_eq!(fs1.read_file(path).unwrap(), b"modified");
    }

    #[test]
    fn test_concurrent_reads() {
        let fs = sample_tree();
        let mut handles = vec![];

        for _ in 0..8 {
            let fs_clone = fs.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    let entries = fs_clone.read_dir(Path::new("proj/app")).unwrap();
                    assert_eq!(entries.len(), 3);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
