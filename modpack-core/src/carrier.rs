//! Carrier template: the text wrapped around the embedded tables

use crate::error::CarrierError;

/// Where the tables are spliced in
pub const CONTENTS_PLACEHOLDER: &str = "${CONTENTS}";
/// Replaced with the hook policy literal
pub const HOOK_PLACEHOLDER: &str = "%{FORCE_EXC_HOOK}";
/// Replaced with the default package name (empty when there is none)
pub const DEFAULT_PACKAGE_PLACEHOLDER: &str = "%{DEFAULT_PACKAGE}";

/// Binding names the built-in carrier uses for the two substitutions
pub const HOOK_BINDING: &str = "FORCE_EXC_HOOK";
pub const DEFAULT_PACKAGE_BINDING: &str = "DEFAULT_PACKAGE";

/// Built-in carrier template
pub const DEFAULT_CARRIER: &str = include_str!("../templates/carrier.template");

/// A carrier template split at its contents placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier {
    prefix: String,
    suffix: String,
}

impl Carrier {
    /// Split a template at its single `${CONTENTS}` placeholder
    pub fn parse(template: &str) -> Result<Self, CarrierError> {
        let (prefix, suffix) = template
            .split_once(CONTENTS_PLACEHOLDER)
            .ok_or(CarrierError::MissingPlaceholder(CONTENTS_PLACEHOLDER))?;

        if suffix.contains(CONTENTS_PLACEHOLDER) {
            return Err(CarrierError::DuplicatePlaceholder(CONTENTS_PLACEHOLDER));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Prefix text with both substitutions applied
    pub fn render_prefix(&self, hook_literal: &str, default_package: &str) -> String {
        self.prefix
            .replace(HOOK_PLACEHOLDER, hook_literal)
            .replace(DEFAULT_PACKAGE_PLACEHOLDER, default_package)
    }

    /// Suffix text, appended verbatim
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for Carrier {
    fn default() -> Self {
        let (prefix, suffix) = DEFAULT_CARRIER
            .split_once(CONTENTS_PLACEHOLDER)
            .unwrap_or((DEFAULT_CARRIER, ""));
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }
}
