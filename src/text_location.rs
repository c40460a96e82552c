//! Source positions for diagnostics.

use std::fmt;
use std::path::{Path, PathBuf};

/// A position in a document or generated file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextLocation {
    /// The file path (if known).
    pub filename: Option<PathBuf>,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl TextLocation {
    pub fn new(filename: Option<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            filename,
            line,
            column,
        }
    }

    /// Creates a TextLocation with only line information.
    pub fn line_only(line: usize) -> Self {
        Self {
            filename: None,
            line,
            column: 1,
        }
    }

    /// Creates a TextLocation with file and line.
    pub fn file_line(filename: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            filename: Some(filename.into()),
            line,
            column: 1,
        }
    }

    /// Attaches a filename when the location has none yet.
    pub fn or_file(mut self, filename: Option<&Path>) -> Self {
        if self.filename.is_none() {
            self.filename = filename.map(Path::to_path_buf);
        }
        self
    }

    /// Returns the location `delta` lines further down the same file.
    pub fn offset(&self, delta: usize) -> Self {
        Self {
            filename: self.filename.clone(),
            line: self.line + delta,
            column: 1,
        }
    }
}

impl Default for TextLocation {
    fn default() -> Self {
        Self {
            filename: None,
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for TextLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filename {
            Some(path) => write!(f, "{}:{}:{}", path.display(), self.line, self.column),
            None => write!(f, "line {}:{}", self.line, self.column),
        }
    }
}
