//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示，逐行打印完整的错误链。

use modpack_core::{CarrierError, PackError};
use modpack_vfs::VfsError;
use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that ends a CLI run early
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Project(String),

    #[error("{} is not a package", .0.display())]
    NotAPackage(PathBuf),

    #[error("cannot read carrier '{}'", path.display())]
    CarrierRead {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("invalid carrier '{}'", path.display())]
    CarrierParse {
        path: PathBuf,
        #[source]
        source: CarrierError,
    },

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error("cannot write '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("cannot write manifest")]
    Manifest(#[source] serde_json::Error),

    #[error("cannot open log file '{}'", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Pack(PackError::InvalidDefaultPackage { .. }) => 2,
            _ => 1,
        }
    }
}

/// Render an error followed by its causes, one per line
pub fn render_error(error: &dyn StdError) -> String {
    let mut out = format!("ERROR: {}", error);
    let mut cause = error.source();
    while let Some(err) = cause {
        out.push_str(&format!("\n  caused by: {}", err));
        cause = err.source();
    }
    out
}

/// 打印错误及其错误链到 stderr
pub fn print_error(error: &dyn StdError) {
    eprintln!("{}", render_error(error));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let bad_default = CliError::Pack(PackError::InvalidDefaultPackage {
            name: "nope".to_string(),
        });
        assert_eq!(bad_default.exit_code(), 2);
        assert_eq!(CliError::NotAPackage(PathBuf::from("src")).exit_code(), 1);
    }

    #[test]
    fn test_render_error_includes_causes() {
        let err = CliError::CarrierParse {
            path: PathBuf::from("wrap.template"),
            source: CarrierError::MissingPlaceholder("${CONTENTS}"),
        };
        let rendered = render_error(&err);
        assert!(rendered.starts_with("ERROR: invalid carrier 'wrap.template'"));
        assert!(rendered.contains("caused by: placeholder '${CONTENTS}' not found"));
    }

    #[test]
    fn test_not_a_package_message() {
        let err = CliError::NotAPackage(PathBuf::from("lib/util"));
        assert_eq!(render_error(&err), "ERROR: lib/util is not a package");
    }
}
