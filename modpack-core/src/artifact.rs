//! Artifact Reader - 从产物文本还原 bundle
//!
//! [`TableSerializer`](crate::serialize::TableSerializer) 的逆过程。先扫描
//! carrier 前缀中的 hook 与默认包绑定；自定义 carrier 缺少这两个绑定时，
//! 回退为 [`HookPolicy::Auto`] 且没有默认包。

use crate::bundle::{Bundle, ModuleKind, Registry, RegistryEntry, SourceTable};
use crate::carrier::{DEFAULT_PACKAGE_BINDING, HOOK_BINDING};
use crate::error::ArtifactError;
use crate::key::LogicalKey;
use modpack_config::{Dialect, HookPolicy, Layout};
use std::path::PathBuf;
use tracing::debug;

/// Read an artifact back into a [`Bundle`]
pub fn read_artifact(text: &str, layout: &Layout, dialect: &Dialect) -> Result<Bundle, ArtifactError> {
    let header = format!("{} = {{\n", dialect.source_table);
    let start = find_line(text, &header)
        .ok_or_else(|| ArtifactError::MissingTable(dialect.source_table.clone()))?;

    let (hook, default_package) = read_bindings(&text[..start], dialect)?;

    let mut cursor = Cursor::new(text, start + header.len());
    let sources = read_source_table(&mut cursor, dialect)?;

    cursor.skip_blank_lines();
    let header = format!("{} = {{", dialect.registry_table);
    if cursor.peek_line() != header {
        return Err(ArtifactError::MissingTable(dialect.registry_table.clone()));
    }
    cursor.read_line();
    let registry = read_registry_table(&mut cursor, dialect)?;

    debug!(
        target: "modpack::read",
        sources = sources.len(),
        registry = registry.len(),
        "Read artifact"
    );

    Ok(Bundle {
        sources,
        registry,
        default_package,
        hook,
        marker: layout.marker_stem.clone(),
    })
}

/// Byte offset of the first line equal to `line` (including its newline)
fn find_line(text: &str, line: &str) -> Option<usize> {
    if text.starts_with(line) {
        return Some(0);
    }
    text.match_indices(line)
        .map(|(i, _)| i)
        .find(|&i| text.as_bytes()[i - 1] == b'\n')
}

fn read_bindings(
    prefix: &str,
    dialect: &Dialect,
) -> Result<(HookPolicy, Option<LogicalKey>), ArtifactError> {
    let mut hook = HookPolicy::Auto;
    let mut default_package = None;

    for (index, line) in prefix.lines().enumerate() {
        let Some((name, value)) = line.split_once(" = ") else {
            continue;
        };
        let line_no = index + 1;

        match name.trim() {
            HOOK_BINDING => {
                let value = value.trim();
                hook = if value == dialect.none_literal {
                    HookPolicy::Auto
                } else if value == dialect.true_literal {
                    HookPolicy::Force
                } else if value == dialect.false_literal {
                    HookPolicy::Disable
                } else {
                    return Err(ArtifactError::Syntax {
                        line: line_no,
                        message: format!("unknown hook literal '{}'", value),
                    });
                };
            }
            DEFAULT_PACKAGE_BINDING => {
                let name = unquote(value.trim()).ok_or_else(|| ArtifactError::Syntax {
                    line: line_no,
                    message: "default package must be a quoted name".to_string(),
                })?;
                default_package = if name.is_empty() {
                    None
                } else {
                    Some(
                        LogicalKey::parse(name)
                            .map_err(|source| ArtifactError::Key { line: line_no, source })?,
                    )
                };
            }
            _ => {}
        }
    }

    Ok((hook, default_package))
}

fn read_source_table(cursor: &mut Cursor<'_>, dialect: &Dialect) -> Result<SourceTable, ArtifactError> {
    let mut table = SourceTable::new();
    let tag_open = format!("{}<tag:", dialect.comment_prefix);
    let mut origin: Option<PathBuf> = None;

    loop {
        cursor.skip_blank_lines();
        if cursor.at_end() {
            return Err(cursor.syntax("unterminated source table"));
        }

        let line_no = cursor.line();
        let line = cursor.read_line();
        if line == "}" {
            return Ok(table);
        }

        if let Some(tag) = line.strip_prefix(tag_open.as_str()) {
            let path = tag.strip_suffix('>').ok_or_else(|| ArtifactError::Syntax {
                line: line_no,
                message: "unterminated tag comment".to_string(),
            })?;
            origin = Some(PathBuf::from(path));
            continue;
        }

        let key = line
            .strip_suffix(dialect.string_delimiter.as_str())
            .and_then(|rest| rest.strip_suffix(": "))
            .and_then(unquote)
            .ok_or_else(|| ArtifactError::Syntax {
                line: line_no,
                message: format!("expected source entry, found '{}'", line),
            })?;
        let key = LogicalKey::parse(key).map_err(|source| ArtifactError::Key { line: line_no, source })?;

        let text = cursor.read_literal(dialect)?;
        if cursor.read_line() != "," {
            return Err(cursor.syntax("expected ',' after source text"));
        }

        if let Err(key) = table.insert_with_origin(key, text, origin.take()) {
            return Err(ArtifactError::Syntax {
                line: line_no,
                message: format!("duplicate source key '{}'", key),
            });
        }
    }
}

fn read_registry_table(cursor: &mut Cursor<'_>, dialect: &Dialect) -> Result<Registry, ArtifactError> {
    let mut registry = Registry::new();

    loop {
        cursor.skip_blank_lines();
        if cursor.at_end() {
            return Err(cursor.syntax("unterminated registry table"));
        }

        let line_no = cursor.line();
        let line = cursor.read_line();
        if line == "}" {
            return Ok(registry);
        }

        let syntax = |message: &str| ArtifactError::Syntax {
            line: line_no,
            message: message.to_string(),
        };

        let (key, payload) = line
            .split_once(": {")
            .ok_or_else(|| syntax("expected registry entry"))?;
        let key = unquote(key).ok_or_else(|| syntax("registry key must be quoted"))?;
        let key = LogicalKey::parse(key).map_err(|source| ArtifactError::Key { line: line_no, source })?;

        let payload = payload
            .strip_suffix("},")
            .ok_or_else(|| syntax("expected '},' after registry payload"))?;
        let (is_package, parent) = payload
            .strip_prefix("\"is_package\": ")
            .and_then(|rest| rest.split_once(", \"parent\": "))
            .ok_or_else(|| syntax("expected is_package and parent fields"))?;

        let kind = if is_package == dialect.true_literal {
            ModuleKind::Package
        } else if is_package == dialect.false_literal {
            ModuleKind::Module
        } else {
            return Err(syntax("is_package must be a boolean literal"));
        };

        let parent = if parent == dialect.none_literal {
            None
        } else {
            let parent = unquote(parent).ok_or_else(|| syntax("parent must be quoted or none"))?;
            Some(LogicalKey::parse(parent).map_err(|source| ArtifactError::Key { line: line_no, source })?)
        };

        let entry = RegistryEntry::new(key, kind);
        if entry.parent != parent {
            return Err(syntax("parent does not match key"));
        }
        if registry.insert(entry).is_err() {
            return Err(syntax("duplicate registry key"));
        }
    }
}

fn unquote(s: &str) -> Option<&str> {
    s.strip_prefix('"')?.strip_suffix('"')
}

/// Byte cursor over artifact text
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// 1-based line number of the cursor
    fn line(&self) -> usize {
        self.text[..self.pos].matches('\n').count() + 1
    }

    fn syntax(&self, message: &str) -> ArtifactError {
        ArtifactError::Syntax {
            line: self.line(),
            message: message.to_string(),
        }
    }

    fn skip_blank_lines(&mut self) {
        while self.rest().starts_with('\n') {
            self.pos += 1;
        }
    }

    fn peek_line(&self) -> &'a str {
        let rest = self.rest();
        rest.split('\n').next().unwrap_or(rest)
    }

    fn read_line(&mut self) -> &'a str {
        let line = self.peek_line();
        self.pos += line.len();
        if self.rest().starts_with('\n') {
            self.pos += 1;
        }
        line
    }

    /// Read one escaped literal body up to and including its closing
    /// delimiter; the header line must already be consumed
    fn read_literal(&mut self, dialect: &Dialect) -> Result<String, ArtifactError> {
        let open_line = self.line();
        let delimiter = dialect.string_delimiter.as_str();
        let escaped = dialect.escaped_delimiter.as_str();
        let mut text = String::new();

        loop {
            let rest = self.rest();
            if rest.starts_with(escaped) {
                text.push_str(delimiter);
                self.pos += escaped.len();
            } else if rest.starts_with(delimiter) {
                self.pos += delimiter.len();
                break;
            } else if let Some(c) = rest.chars().next() {
                text.push(c);
                self.pos += c.len_utf8();
            } else {
                return Err(ArtifactError::Syntax {
                    line: open_line,
                    message: "unterminated source literal".to_string(),
                });
            }
        }

        // The serializer wraps every body in one newline on each side
        match text.strip_suffix('\n') {
            Some(body) => Ok(body.to_string()),
            None => Err(ArtifactError::Syntax {
                line: open_line,
                message: "source literal must end with a newline".to_string(),
            }),
        }
    }
}
