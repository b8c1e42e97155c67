//! Modpack Runtime - the embedded resolver
//!
//! A [`Resolver`] answers import requests from a [`Bundle`](modpack_core::Bundle)
//! instead of the filesystem. Namespaces and execution belong to a [`Host`];
//! [`ScriptHost`] is a small reference host used by tests and demos.

pub mod error;
pub mod error_hook;
pub mod host;
pub mod module;
pub mod resolver;
pub mod script;

pub use error::ResolveError;
pub use host::{ExternalSource, Host};
pub use module::{Module, ModuleRef, ModuleSpec, ModuleState};
pub use resolver::Resolver;
pub use script::{Namespace, ScriptError, ScriptHost, ScriptModule, Value};

use modpack_config::{Dialect, Layout};
use modpack_core::{read_artifact, ArtifactError};

/// Read an artifact and build a resolver over it
pub fn load_artifact<H: Host>(
    text: &str,
    layout: &Layout,
    dialect: &Dialect,
    host: H,
) -> Result<Resolver<H>, ArtifactError> {
    let bundle = read_artifact(text, layout, dialect)?;
    Ok(Resolver::new(bundle, host))
}
