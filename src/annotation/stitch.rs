//! Recovers fragment boundaries and content from annotated files.

use std::path::{Path, PathBuf};
use std::str::Lines;

use super::protocol::{AnnotationSyntax, OpenMarker};
use crate::errors::{EntangledError, Result};
use crate::model::ReferenceId;
use crate::text_location::TextLocation;

/// A fragment occurrence read back from an annotated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchedFragment {
    pub id: ReferenceId,
    /// Document the fragment was tangled from.
    pub origin: PathBuf,
    /// Whether this was the first fragment of a nested reference.
    pub is_init: bool,
    /// Indentation of the markers, stripped from every content line.
    pub indent: String,
    /// Content with nested occurrences replaced by `<<name>>` lines.
    pub lines: Vec<String>,
    /// Line of the begin marker.
    pub location: TextLocation,
}

impl StitchedFragment {
    /// The content as text, each line terminated by `\n`.
    pub fn source(&self) -> String {
        let len = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut out = String::with_capacity(len);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

struct OpenFrame {
    marker: OpenMarker,
    line: usize,
    lines: Vec<String>,
}

/// Single forward scan over an annotated file.
///
/// Yields fragments in the order their end markers appear, so nested
/// occurrences come before the fragment that contains them. The first error
/// ends the iteration.
pub struct FragmentReader<'a> {
    syntax: &'a AnnotationSyntax,
    lines: std::iter::Enumerate<Lines<'a>>,
    path: Option<PathBuf>,
    stack: Vec<OpenFrame>,
    failed: bool,
}

impl<'a> FragmentReader<'a> {
    pub fn new(text: &'a str, syntax: &'a AnnotationSyntax) -> Self {
        Self {
            syntax,
            lines: text.lines().enumerate(),
            path: None,
            stack: Vec::new(),
            failed: false,
        }
    }

    /// Attaches the file name to error locations.
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    fn malformed(&mut self, line: usize, message: String) -> EntangledError {
        self.failed = true;
        EntangledError::MalformedAnnotation {
            location: TextLocation::line_only(line).or_file(self.path.as_deref()),
            message,
        }
    }

    fn open(&mut self, marker: OpenMarker, line: usize) -> Result<()> {
        if let Some(parent) = self.stack.last_mut() {
            let Some(extra) = marker.indent.strip_prefix(parent.marker.indent.as_str()) else {
                return Err(self.malformed(
                    line,
                    format!(
                        "begin marker for {} is indented less than its enclosing fragment",
                        marker.id
                    ),
                ));
            };
            if marker.is_init {
                parent
                    .lines
                    .push(format!("{}<<{}>>", extra, marker.id.name));
            }
        }
        self.stack.push(OpenFrame {
            marker,
            line,
            lines: Vec::new(),
        });
        Ok(())
    }

    fn close(
        &mut self,
        indent: &str,
        label: Option<(PathBuf, ReferenceId)>,
        line: usize,
    ) -> Result<StitchedFragment> {
        let Some(frame) = self.stack.pop() else {
            return Err(self.malformed(line, "end marker without a matching begin".to_string()));
        };
        if indent != frame.marker.indent {
            return Err(self.malformed(
                line,
                format!(
                    "end marker indentation does not match begin marker at line {}",
                    frame.line
                ),
            ));
        }
        if let Some((origin, id)) = label {
            if id != frame.marker.id || origin != frame.marker.origin {
                return Err(self.malformed(
                    line,
                    format!(
                        "end marker for {} does not match begin marker for {} at line {}",
                        id, frame.marker.id, frame.line
                    ),
                ));
            }
        }

        let location = TextLocation::line_only(frame.line).or_file(self.path.as_deref());
        let OpenFrame { marker, lines, .. } = frame;
        tracing::trace!("stitched {} ({} lines)", marker.id, lines.len());
        Ok(StitchedFragment {
            id: marker.id,
            origin: marker.origin,
            is_init: marker.is_init,
            indent: marker.indent,
            lines,
            location,
        })
    }

    fn content(&mut self, text: &str, line: usize) -> Result<()> {
        let Some(frame) = self.stack.last_mut() else {
            return Ok(());
        };
        if let Some(stripped) = text.strip_prefix(frame.marker.indent.as_str()) {
            frame.lines.push(stripped.to_string());
        } else if text.trim().is_empty() {
            frame.lines.push(String::new());
        } else {
            let id = frame.marker.id.clone();
            return Err(self.malformed(
                line,
                format!("line is indented less than the markers of {}", id),
            ));
        }
        Ok(())
    }
}

impl Iterator for FragmentReader<'_> {
    type Item = Result<StitchedFragment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while let Some((index, text)) = self.lines.next() {
            let line = index + 1;
            if let Some(marker) = self.syntax.parse_open(text) {
                if let Err(e) = self.open(marker, line) {
                    return Some(Err(e));
                }
            } else if let Some(marker) = self.syntax.parse_close(text) {
                return Some(self.close(&marker.indent, marker.label, line));
            } else if self.syntax.looks_like_marker(text) {
                let message = format!("unrecognised annotation marker `{}`", text.trim());
                return Some(Err(self.malformed(line, message)));
            } else if let Err(e) = self.content(text, line) {
                return Some(Err(e));
            }
        }

        let unclosed = self.stack.last().map(|frame| (frame.line, frame.marker.id.clone()));
        unclosed.map(|(line, id)| Err(self.malformed(line, format!("{} is never closed", id))))
    }
}

/// Reads every fragment occurrence from annotated text.
///
/// All-or-nothing: a single malformed marker fails the whole file.
pub fn read_fragments(text: &str, syntax: &AnnotationSyntax) -> Result<Vec<StitchedFragment>> {
    FragmentReader::new(text, syntax).collect()
}

/// Like [`read_fragments`], with the file name in error locations.
pub fn read_fragments_from(
    path: &Path,
    text: &str,
    syntax: &AnnotationSyntax,
) -> Result<Vec<StitchedFragment>> {
    FragmentReader::new(text, syntax).with_path(path).collect()
}
