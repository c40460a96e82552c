//! Named and anonymous code fragments.

use std::ops::Range;
use std::path::{Path, PathBuf};

use super::reference_id::ReferenceId;
use super::reference_name::ReferenceName;
use crate::text_location::TextLocation;

/// A chunk of code taken from a document.
///
/// Fragments sharing a name are concatenated in document order to form that
/// name's full definition. Lines are stored without their line terminators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Name and position in the name's sequence. Assigned on registration.
    pub id: ReferenceId,

    /// The language identifier (e.g., "python", "rust").
    pub language: Option<String>,

    /// Content lines.
    pub lines: Vec<String>,

    /// Location of the first content line in the originating document.
    pub location: TextLocation,

    /// Output file declared with `file=`, if any.
    pub target: Option<PathBuf>,

    /// Remaining `key=value` attributes of the fence header.
    pub attributes: Vec<(String, String)>,
}

impl Fragment {
    pub fn new(
        name: ReferenceName,
        language: Option<String>,
        lines: Vec<String>,
        location: TextLocation,
    ) -> Self {
        Self {
            id: ReferenceId::first(name),
            language,
            lines,
            location,
            target: None,
            attributes: Vec::new(),
        }
    }

    /// Creates a fragment by splitting `source` into lines.
    pub fn from_source(
        name: ReferenceName,
        language: Option<String>,
        source: &str,
        location: TextLocation,
    ) -> Self {
        Self::new(name, language, split_lines(source), location)
    }

    /// The fragment's name, or `None` for anonymous fragments.
    pub fn name(&self) -> Option<&ReferenceName> {
        if self.id.name.is_anonymous() {
            None
        } else {
            Some(&self.id.name)
        }
    }

    /// The name the fragment is registered under (generated when anonymous).
    pub fn key(&self) -> &ReferenceName {
        &self.id.name
    }

    /// The document this fragment was read from.
    pub fn origin(&self) -> Option<&Path> {
        self.location.filename.as_deref()
    }

    /// Lines of the originating document covered by the content (1-indexed, end exclusive).
    pub fn line_range(&self) -> Range<usize> {
        self.location.line..self.location.line + self.lines.len()
    }

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

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub fn with_target(mut self, target: PathBuf) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_attribute(mut self, key: String, value: String) -> Self {
        self.attributes.push((key, value));
        self
    }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Splits text into lines without terminators. A trailing newline does not
/// produce an extra empty line.
pub fn split_lines(source: &str) -> Vec<String> {
    source.lines().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_source() {
        let fragment = Fragment::from_source(
            ReferenceName::new("main"),
            Some("python".to_string()),
            "print('hello')\nprint('world')\n",
            TextLocation::file_line("doc.md", 10),
        );

        assert_eq!(fragment.name().map(|n| n.as_str()), Some("main"));
        assert_eq!(fragment.lines, vec!["print('hello')", "print('world')"]);
        assert_eq!(fragment.source(), "print('hello')\nprint('world')\n");
        assert_eq!(fragment.origin(), Some(Path::new("doc.md")));
        assert_eq!(fragment.line_range(), 10..12);
    }

    #[test]
    fn test_anonymous_has_no_name() {
        let fragment = Fragment::new(
            ReferenceName::anonymous("doc.md", 0),
            None,
            vec![],
            TextLocation::default(),
        );
        assert!(fragment.name().is_none());
        assert!(fragment.key().is_anonymous());
    }

    #[test]
    fn test_target_and_attributes() {
        let fragment = Fragment::new(ReferenceName::new("m"), None, vec![], TextLocation::default())
            .with_target(PathBuf::from("out.py"))
            .with_attribute("mode".to_string(), "0755".to_string());

        assert!(fragment.has_target());
        assert_eq!(fragment.get_attribute("mode"), Some("0755"));
        assert_eq!(fragment.get_attribute("missing"), None);
    }
}
