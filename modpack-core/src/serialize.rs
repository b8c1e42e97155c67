//! Table Serializer - 把 bundle 写成产物文本

use crate::bundle::Bundle;
use crate::carrier::Carrier;
use crate::error::PackError;
use modpack_config::Dialect;
use std::fmt::Write;
use tracing::debug;

/// Escape every delimiter occurrence inside embedded text
pub fn escape(text: &str, dialect: &Dialect) -> String {
    text.replace(&dialect.string_delimiter, &dialect.escaped_delimiter)
}

/// Writes a bundle as carrier prefix, source table, registry table, suffix
#[derive(Debug, Clone)]
pub struct TableSerializer<'a> {
    dialect: &'a Dialect,
    tagging: bool,
}

impl<'a> TableSerializer<'a> {
    pub fn new(dialect: &'a Dialect) -> Self {
        Self {
            dialect,
            tagging: false,
        }
    }

    /// Precede each source entry with a `<tag:path>` comment line
    pub fn with_tagging(mut self, tagging: bool) -> Self {
        self.tagging = tagging;
        self
    }

    pub fn serialize(&self, bundle: &Bundle, carrier: &Carrier) -> Result<String, PackError> {
        let dialect = self.dialect;
        let default_package = bundle
            .default_package
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        let mut out = carrier.render_prefix(dialect.hook_literal(bundle.hook), &default_package);

        write!(out, "\n\n{} = {{\n", dialect.source_table)?;
        for entry in bundle.sources.iter() {
            if self.tagging {
                if let Some(origin) = &entry.origin {
                    writeln!(out, "{}<tag:{}>", dialect.comment_prefix, origin.display())?;
                }
            }
            write!(
                out,
                "\"{key}\": {delim}\n{text}\n{delim},\n",
                key = entry.key,
                delim = dialect.string_delimiter,
                text = escape(&entry.text, dialect),
            )?;
        }
        out.push_str("\n\n}\n");

        write!(out, "\n\n{} = {{\n", dialect.registry_table)?;
        for entry in bundle.registry.iter() {
            let parent = match &entry.parent {
                Some(parent) => format!("\"{}\"", parent),
                None => dialect.none_literal.clone(),
            };
            writeln!(
                out,
                "\"{}\": {{\"is_package\": {}, \"parent\": {}}},",
                entry.key,
                dialect.bool_literal(entry.is_package()),
                parent,
            )?;
        }
        out.push_str("\n\n}\n");

        out.push_str(carrier.suffix());

        debug!(
            target: "modpack::emit",
            sources = bundle.sources.len(),
            registry = bundle.registry.len(),
            bytes = out.len(),
            "Serialized tables"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{ModuleKind, Registry, RegistryEntry, SourceTable};
    use crate::key::LogicalKey;
    use modpack_config::HookPolicy;
    use std::path::PathBuf;

    fn key(s: &str) -> LogicalKey {
        LogicalKey::parse(s).unwrap()
    }

    fn app_bundle() -> Bundle {
        let mut sources = SourceTable::new();
        sources
            .insert_with_origin(
                key("app.greet"),
                "def hi(): return \"hi\"".to_string(),
                Some(PathBuf::from("app/greet.py")),
            )
            .unwrap();
        sources
            .insert_with_origin(key("app.__init__"), String::new(), Some(PathBuf::from("app/__init__.py")))
            .unwrap();

        let mut registry = Registry::new();
        registry
            .insert(RegistryEntry::new(key("app.greet"), ModuleKind::Module))
            .unwrap();
        registry
            .insert(RegistryEntry::new(key("app"), ModuleKind::Package))
            .unwrap();

        Bundle {
            sources,
            registry,
            default_package: Some(key("app")),
            hook: HookPolicy::Force,
            marker: "__init__".to_string(),
        }
    }

    #[test]
    fn test_exact_layout() {
        let dialect = Dialect::default();
        let carrier = Carrier::parse("H=%{FORCE_EXC_HOOK} D=%{DEFAULT_PACKAGE}${CONTENTS}END").unwrap();
        let out = TableSerializer::new(&dialect)
            .serialize(&app_bundle(), &carrier)
            .unwrap();

        let expected = concat!(
            "H=True D=app",
            "\n\ndata = {\n",
            "\"app.greet\": \"\"\"\ndef hi(): return \"hi\"\n\"\"\",\n",
            "\"app.__init__\": \"\"\"\n\n\"\"\",\n",
            "\n\n}\n",
            "\n\ninliner_packages = {\n",
            "\"app.greet\": {\"is_package\": False, \"parent\": \"app\"},\n",
            "\"app\": {\"is_package\": True, \"parent\": None},\n",
            "\n\n}\n",
            "END",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_tagging() {
        let dialect = Dialect::default();
        let out = TableSerializer::new(&dialect)
            .with_tagging(true)
            .serialize(&app_bundle(), &Carrier::default())
            .unwrap();

        assert!(out.contains("# <tag:app/greet.py>\n\"app.greet\": \"\"\"\n"));
        assert!(out.contains("# <tag:app/__init__.py>\n\"app.__init__\""));
    }

    #[test]
    fn test_escape_only_delimiter() {
        let dialect = Dialect::default();
        assert_eq!(escape(r#"x = """doc""""#, &dialect), r#"x = \"""doc\""""#);
        assert_eq!(escape("'''single''' and \"\"", &dialect), "'''single''' and \"\"");
    }

    #[test]
    fn test_no_trailing_newline_added() {
        let dialect = Dialect::default();
        let carrier = Carrier::parse("${CONTENTS}").unwrap();
        let out = TableSerializer::new(&dialect)
            .serialize(&app_bundle(), &carrier)
            .unwrap();
        assert!(out.ends_with("\n\n}\n"));
    }
}
