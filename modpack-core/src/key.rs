//! Logical keys: dotted module paths independent of the filesystem

use serde::Serialize;
use std::fmt;

/// Error type for logical key parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("Empty module path")]
    Empty,

    #[error("Invalid module path: {0}")]
    InvalidSegment(String),

    #[error("Empty component in path: {0}")]
    EmptySegment(String),
}

/// Logical key
///
/// Represents a module path like "app.greet" as segments ["app", "greet"].
/// Every segment is a non-empty run of alphanumerics and underscores, so
/// joining with `.` is always invertible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct LogicalKey {
    segments: Vec<String>,
}

impl LogicalKey {
    /// Parse a dotted path into a LogicalKey
    ///
    /// # Examples
    /// ```
    /// use modpack_core::LogicalKey;
    ///
    /// let key = LogicalKey::parse("app.greet").unwrap();
    /// assert_eq!(key.segments(), ["app", "greet"]);
    /// ```
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        if s.is_empty() {
            return Err(KeyError::Empty);
        }

        if !s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
            return Err(KeyError::InvalidSegment(s.to_string()));
        }

        let segments: Vec<String> = s.split('.').map(|s| s.to_string()).collect();

        // e.g. "app..greet"
        if segments.iter().any(|c| c.is_empty()) {
            return Err(KeyError::EmptySegment(s.to_string()));
        }

        Ok(Self { segments })
    }

    /// Build a key from a single segment
    pub fn segment(name: &str) -> Result<Self, KeyError> {
        if !is_segment(name) {
            return Err(if name.is_empty() {
                KeyError::Empty
            } else {
                KeyError::InvalidSegment(name.to_string())
            });
        }
        Ok(Self {
            segments: vec![name.to_string()],
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment ("app" for "app.greet")
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// Last segment ("greet" for "app.greet")
    pub fn name(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: a key has at least one segment
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Parent key
    ///
    /// ["app", "greet"] -> Some(["app"])
    pub fn parent(&self) -> Option<LogicalKey> {
        self.strip_last(1)
    }

    /// Remove `n` segments from the end; `None` if nothing would remain
    pub fn strip_last(&self, n: usize) -> Option<LogicalKey> {
        if n >= self.segments.len() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - n].to_vec(),
        })
    }

    /// Append one segment
    pub fn child(&self, name: &str) -> Result<LogicalKey, KeyError> {
        let tail = Self::segment(name)?;
        Ok(self.join(&tail))
    }

    /// Concatenate two keys
    pub fn join(&self, tail: &LogicalKey) -> LogicalKey {
        let mut segments = self.segments.clone();
        segments.extend(tail.segments.iter().cloned());
        Self { segments }
    }

    /// True when `self` equals `prefix` or lives below it
    pub fn starts_with(&self, prefix: &LogicalKey) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Every proper prefix, outermost first
    ///
    /// "a.b.c" -> ["a", "a.b"]
    pub fn ancestors(&self) -> impl Iterator<Item = LogicalKey> + '_ {
        (1..self.segments.len()).map(move |n| Self {
            segments: self.segments[..n].to_vec(),
        })
    }

    /// Resolve a relative reference against this package key
    ///
    /// `level` counts leading dots: 1 is the package itself, 2 its parent,
    /// and so on. Returns `None` when the reference climbs above the root.
    ///
    /// ```
    /// use modpack_core::LogicalKey;
    ///
    /// let pkg = LogicalKey::parse("app.sub").unwrap();
    /// let tail = LogicalKey::parse("util").unwrap();
    /// let key = pkg.resolve_relative(2, Some(&tail)).unwrap();
    /// assert_eq!(key.to_string(), "app.util");
    /// ```
    pub fn resolve_relative(&self, level: usize, tail: Option<&LogicalKey>) -> Option<LogicalKey> {
        if level == 0 {
            return tail.cloned();
        }
        let base = self.strip_last(level - 1)?;
        Some(match tail {
            Some(tail) => base.join(tail),
            None => base,
        })
    }
}

/// Check whether `s` is usable as one key segment
pub fn is_segment(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<LogicalKey> for String {
    fn from(key: LogicalKey) -> Self {
        key.to_string()
    }
}

impl std::str::FromStr for LogicalKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let key = LogicalKey::parse("app").unwrap();
        assert_eq!(key.segments(), ["app"]);
        assert_eq!(key.head(), "app");
        assert_eq!(key.name(), "app");
    }

    #[test]
    fn test_parse_nested() {
        let key = LogicalKey::parse("app.sub.__init__").unwrap();
        assert_eq!(key.segments(), ["app", "sub", "__init__"]);
        assert_eq!(key.len(), 3);
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(LogicalKey::parse(""), Err(KeyError::Empty)));
    }

    #[test]
    fn test_parse_empty_segment() {
        assert!(matches!(
            LogicalKey::parse("app..greet"),
            Err(KeyError::EmptySegment(_))
        ));
        assert!(matches!(
            LogicalKey::parse(".greet"),
            Err(KeyError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_parse_invalid_char() {
        assert!(matches!(
            LogicalKey::parse("app/greet"),
            Err(KeyError::InvalidSegment(_))
        ));
        assert!(matches!(
            LogicalKey::parse("my-module"),
            Err(KeyError::InvalidSegment(_))
        ));
    }

    #[test]
    fn test_segment_rejects_dots() {
        assert!(LogicalKey::segment("greet").is_ok());
        assert!(matches!(
            LogicalKey::segment("a.b"),
            Err(KeyError::InvalidSegment(_))
        ));
    }

    #[test]
    fn test_parent_and_strip() {
        let key = LogicalKey::parse("a.b.c").unwrap();
        assert_eq!(key.parent().unwrap().to_string(), "a.b");
        assert_eq!(key.strip_last(2).unwrap().to_string(), "a");
        assert!(key.strip_last(3).is_none());
        assert!(LogicalKey::parse("a").unwrap().parent().is_none());
    }

    #[test]
    fn test_child_and_join() {
        let pkg = LogicalKey::parse("app").unwrap();
        assert_eq!(pkg.child("__init__").unwrap().to_string(), "app.__init__");

        let tail = LogicalKey::parse("sub.deep").unwrap();
        assert_eq!(pkg.join(&tail).to_string(), "app.sub.deep");
    }

    #[test]
    fn test_starts_with() {
        let app = LogicalKey::parse("app").unwrap();
        let greet = LogicalKey::parse("app.greet").unwrap();
        let apple = LogicalKey::parse("apple").unwrap();

        assert!(greet.starts_with(&app));
        assert!(app.starts_with(&app));
        assert!(!apple.starts_with(&app));
    }

    #[test]
    fn test_ancestors() {
        let key = LogicalKey::parse("a.b.c").unwrap();
        let ancestors: Vec<String> = key.ancestors().map(|k| k.to_string()).collect();
        assert_eq!(ancestors, ["a", "a.b"]);
    }

    #[test]
    fn test_resolve_relative() {
        let pkg = LogicalKey::parse("app.sub").unwrap();
        let tail = LogicalKey::parse("x").unwrap();

        assert_eq!(
            pkg.resolve_relative(1, Some(&tail)).unwrap().to_string(),
            "app.sub.x"
        );
        assert_eq!(pkg.resolve_relative(2, None).unwrap().to_string(), "app");
        assert!(pkg.resolve_relative(3, Some(&tail)).is_none());
        assert_eq!(pkg.resolve_relative(0, Some(&tail)), Some(tail));
    }

    #[test]
    fn test_serialize_as_string() {
        let key = LogicalKey::parse("app.greet").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"app.greet\"");
    }
}
