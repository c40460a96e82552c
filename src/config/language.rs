//! Languages and their comment styles.

use serde::{Deserialize, Serialize};

/// Comment delimiters used to embed annotation markers in generated code.
///
/// In TOML either `comment = "#"` or `comment = { open = "/*", close = "*/" }`.
/// A table without `close` behaves like a line comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Comment {
    /// Single line comment prefix, e.g., "//" or "#"
    Line(String),
    /// Comment with open and (optional) close delimiters, e.g., "/*" and "*/"
    Block {
        open: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        close: String,
    },
}

impl Comment {
    pub fn line(prefix: impl Into<String>) -> Self {
        Comment::Line(prefix.into())
    }

    pub fn block(open: impl Into<String>, close: impl Into<String>) -> Self {
        Comment::Block {
            open: open.into(),
            close: close.into(),
        }
    }

    /// The opening delimiter.
    pub fn open(&self) -> &str {
        match self {
            Comment::Line(prefix) => prefix,
            Comment::Block { open, .. } => open,
        }
    }

    /// The closing delimiter, if the style has one.
    pub fn close(&self) -> Option<&str> {
        match self {
            Comment::Block { close, .. } if !close.is_empty() => Some(close),
            _ => None,
        }
    }

    /// Wraps text in a comment.
    pub fn wrap(&self, text: &str) -> String {
        match self.close() {
            Some(close) => format!("{} {} {}", self.open(), text, close),
            None => format!("{} {}", self.open(), text),
        }
    }
}

impl Default for Comment {
    fn default() -> Self {
        Comment::Line("#".to_string())
    }
}

/// Language configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Language identifier (e.g., "python", "rust")
    pub name: String,

    /// Alternative identifiers accepted in fence headers
    #[serde(default)]
    pub identifiers: Vec<String>,

    pub comment: Comment,
}

impl Language {
    pub fn new(name: impl Into<String>, comment: Comment) -> Self {
        Self {
            name: name.into(),
            identifiers: Vec::new(),
            comment,
        }
    }

    pub fn with_identifiers(mut self, identifiers: &[&str]) -> Self {
        self.identifiers = identifiers.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Checks if this language matches a given identifier.
    pub fn matches(&self, identifier: &str) -> bool {
        self.name == identifier || self.identifiers.iter().any(|id| id == identifier)
    }
}
