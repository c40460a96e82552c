//! Fragment names.

use std::fmt;

/// Prefix of names that are generated for fragments without an `#id`.
const ANONYMOUS_PREFIX: &str = "__anonymous";

/// Regex class matching one character of a referable name. Must agree with
/// [`is_name_char`].
pub const NAME_CHAR_CLASS: &str = r"[\w:/_.+-]";

/// Whether `c` may appear in a fragment name.
pub fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '/' | '.' | '+')
}

/// The name under which fragments are registered and referenced.
///
/// Names may contain word characters and `: / _ . + -`. Fragments that only
/// declare an output file are named `file:<path>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceName(String);

impl ReferenceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Generated name for the `n`-th anonymous fragment of a document.
    pub fn anonymous(document: &str, n: usize) -> Self {
        Self(format!("{}:{}:{}", ANONYMOUS_PREFIX, document, n))
    }

    /// Creates a file target reference name from a path.
    pub fn from_file_path(path: &str) -> Self {
        Self(format!("file:{}", path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks if this is a file target (starts with "file:").
    pub fn is_file_target(&self) -> bool {
        self.0.starts_with("file:")
    }

    /// Returns the file path if this is a file target.
    pub fn file_path(&self) -> Option<&str> {
        self.0.strip_prefix("file:")
    }

    /// True for names generated by [`ReferenceName::anonymous`].
    pub fn is_anonymous(&self) -> bool {
        self.0.starts_with(ANONYMOUS_PREFIX)
    }

    /// Checks that the name can appear inside `<<...>>`.
    pub fn is_referable(&self) -> bool {
        !self.0.is_empty()
            && !self.is_anonymous()
            && self.0.chars().all(is_name_char)
    }
}

impl fmt::Display for ReferenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ReferenceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ReferenceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ReferenceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_char_class_agrees_with_predicate() {
        let class = regex::Regex::new(&format!("^{}$", NAME_CHAR_CLASS)).unwrap();
        for c in "aZ9_-:/.+é #<>=\"'{}[]()*".chars() {
            assert_eq!(
                class.is_match(&c.to_string()),
                is_name_char(c),
                "disagreement on {:?}",
                c
            );
        }
    }

    #[test]
    fn test_simple_name() {
        let name = ReferenceName::new("main");
        assert_eq!(name.as_str(), "main");
        assert!(!name.is_file_target());
        assert!(name.is_referable());
    }

    #[test]
    fn test_file_target() {
        let name = ReferenceName::from_file_path("src/main.rs");
        assert!(name.is_file_target());
        assert_eq!(name.file_path(), Some("src/main.rs"));
        assert_eq!(name.as_str(), "file:src/main.rs");
        assert!(name.is_referable());
    }

    #[test]
    fn test_anonymous() {
        let name = ReferenceName::anonymous("doc.md", 2);
        assert!(name.is_anonymous());
        assert!(!name.is_referable());
        assert_ne!(name, ReferenceName::anonymous("doc.md", 3));
    }

    #[test]
    fn test_not_referable() {
        assert!(!ReferenceName::new("has space").is_referable());
        assert!(!ReferenceName::new("a#b").is_referable());
        assert!(!ReferenceName::new("").is_referable());
    }
}
