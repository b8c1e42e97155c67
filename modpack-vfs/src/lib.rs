//! Modpack Virtual File System
//!
//! A virtual file system abstraction with an in-memory and a native backend.
//! The packer walks source trees through it, and hosts can use it as their
//! own search root.
//!
//! # Usage
//! ```rust,ignore
//! use modpack_vfs::{VirtualFileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("app/__init__.py"), b"").unwrap();
//! let entries = fs.read_dir(Path::new("app")).unwrap();
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::VirtualFileSystem;

/// Create a new memory-based file system.
pub fn memory_fs() -> MemoryFileSystem {
    MemoryFileSystem::new()
}

/// Create a new native file system.
pub fn native_fs() -> NativeFileSystem {
    NativeFileSystem::new()
}
