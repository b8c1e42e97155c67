//! Modpack Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Modpack crates.

use serde::{Deserialize, Serialize};

/// On-disk layout of a source tree
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Extension (without the dot) of source files
    pub source_extension: String,
    /// File stem whose presence turns a directory into a package
    pub marker_stem: String,
}

impl Layout {
    /// File name of the package marker, e.g. `__init__.py`
    pub fn marker_file_name(&self) -> String {
        format!("{}.{}", self.marker_stem, self.source_extension)
    }

    /// Strip the source extension from a file name.
    ///
    /// Returns `None` when the name does not carry the source extension.
    pub fn source_stem<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let stem = file_name.strip_suffix(self.source_extension.as_str())?;
        let stem = stem.strip_suffix('.')?;
        (!stem.is_empty()).then_some(stem)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            source_extension: "py".to_string(),
            marker_stem: "__init__".to_string(),
        }
    }
}

/// Literal syntax used for the embedded tables
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Dialect {
    /// Delimiter wrapping embedded source text
    pub string_delimiter: String,
    /// What the delimiter is rewritten to inside source text
    pub escaped_delimiter: String,
    /// Line comment prefix (used for tag markers)
    pub comment_prefix: String,
    pub true_literal: String,
    pub false_literal: String,
    pub none_literal: String,
    /// Binding name of the source table
    pub source_table: String,
    /// Binding name of the registry table
    pub registry_table: String,
}

impl Dialect {
    /// Literal for a boolean value
    pub fn bool_literal(&self, value: bool) -> &str {
        if value {
            &self.true_literal
        } else {
            &self.false_literal
        }
    }

    /// Literal for a hook policy (`None` means the artifact decides)
    pub fn hook_literal(&self, policy: HookPolicy) -> &str {
        match policy {
            HookPolicy::Auto => &self.none_literal,
            HookPolicy::Force => &self.true_literal,
            HookPolicy::Disable => &self.false_literal,
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            string_delimiter: "\"\"\"".to_string(),
            escaped_delimiter: "\\\"\"\"".to_string(),
            comment_prefix: "# ".to_string(),
            true_literal: "True".to_string(),
            false_literal: "False".to_string(),
            none_literal: "None".to_string(),
            source_table: "data".to_string(),
            registry_table: "inliner_packages".to_string(),
        }
    }
}

/// Whether the artifact installs a process-wide error hook
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPolicy {
    /// Let the artifact decide at run time
    #[default]
    Auto,
    /// Always install
    Force,
    /// Never install
    Disable,
}

impl From<Option<bool>> for HookPolicy {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => HookPolicy::Auto,
            Some(true) => HookPolicy::Force,
            Some(false) => HookPolicy::Disable,
        }
    }
}

/// What to do with directory entries that are neither modules nor packages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredEntries {
    #[default]
    Silent,
    Warn,
}

/// Configuration for one packing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    pub layout: Layout,
    pub dialect: Dialect,
    /// Emit a `<tag:path>` comment before each embedded file
    pub tagging: bool,
    pub ignored: IgnoredEntries,
}

/// Processing phase, used for log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Walk,
    Emit,
    Read,
    Resolve,
}

impl Phase {
    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Walk => "walk",
            Phase::Emit => "emit",
            Phase::Read => "read",
            Phase::Resolve => "resolve",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("modpack::{}", self.as_str())
    }

    /// All phases, in pipeline order
    pub fn all() -> [Phase; 4] {
        [Phase::Walk, Phase::Emit, Phase::Read, Phase::Resolve]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = Layout::default();
        assert_eq!(layout.marker_file_name(), "__init__.py");
    }

    #[test]
    fn test_source_stem() {
        let layout = Layout::default();
        assert_eq!(layout.source_stem("greet.py"), Some("greet"));
        assert_eq!(layout.source_stem("greet.pyc"), None);
        assert_eq!(layout.source_stem("greetpy"), None);
        assert_eq!(layout.source_stem(".py"), None);
    }

    #[test]
    fn test_hook_policy_from_flag() {
        assert_eq!(HookPolicy::from(None), HookPolicy::Auto);
        assert_eq!(HookPolicy::from(Some(true)), HookPolicy::Force);
        assert_eq!(HookPolicy::from(Some(false)), HookPolicy::Disable);
    }

    #[test]
    fn test_dialect_literals() {
        let dialect = Dialect::default();
        assert_eq!(dialect.bool_literal(true), "True");
        assert_eq!(dialect.hook_literal(HookPolicy::Auto), "None");
        assert_eq!(dialect.hook_literal(HookPolicy::Disable), "False");
    }

    #[test]
    fn test_phase_target() {
        assert_eq!(Phase::Walk.as_str(), "walk");
        assert_eq!(Phase::Resolve.target(), "modpack::resolve");
    }

    #[test]
    fn test_partial_config_from_json() {
        let cfg: PackConfig =
            serde_json::from_str(r#"{"tagging": true, "layout": {"source_extension": "lua"}}"#)
                .unwrap();
        assert!(cfg.tagging);
        assert_eq!(cfg.layout.source_extension, "lua");
        assert_eq!(cfg.layout.marker_stem, "__init__");
        assert_eq!(cfg.ignored, IgnoredEntries::Silent);
    }
}
