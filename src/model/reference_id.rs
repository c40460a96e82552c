//! Identity of a single fragment within its name's sequence.

use std::fmt;

use super::ReferenceName;

/// Identifies one fragment: its name and its position among all fragments
/// sharing that name (0-indexed, in document order).
///
/// This pair, not the content, is what ties a fragment in a document to its
/// occurrence in an annotated file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceId {
    pub name: ReferenceName,
    pub index: usize,
}

impl ReferenceId {
    pub fn new(name: ReferenceName, index: usize) -> Self {
        Self { name, index }
    }

    /// The first fragment of a name.
    pub fn first(name: ReferenceName) -> Self {
        Self { name, index: 0 }
    }

    /// Parses the `name[index]` form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        let (name, rest) = s.rsplit_once('[')?;
        let index = rest.strip_suffix(']')?.parse::<usize>().ok()?;
        if name.is_empty() {
            return None;
        }
        Some(Self::new(ReferenceName::new(name), index))
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = ReferenceId::new(ReferenceName::new("function"), 2);
        assert_eq!(id.to_string(), "function[2]");
        assert_eq!(ReferenceId::parse("function[2]"), Some(id));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ReferenceId::parse("no_brackets").is_none());
        assert!(ReferenceId::parse("bad[count]").is_none());
        assert!(ReferenceId::parse("unclosed[3").is_none());
        assert!(ReferenceId::parse("[3]").is_none());
    }

    #[test]
    fn test_ordering_follows_sequence() {
        let a = ReferenceId::new(ReferenceName::new("x"), 0);
        let b = ReferenceId::new(ReferenceName::new("x"), 1);
        assert!(a < b);
    }
}
