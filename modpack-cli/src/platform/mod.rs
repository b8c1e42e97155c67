//! 平台相关的终端输出

pub mod cli;

pub use cli::{print_error, CliError};
