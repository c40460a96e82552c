//! Begin/end marker grammar for annotated output.
//!
//! ```text
//! <indent><comment> ~/~ begin <<doc.md#name>>[init|N]<close?>
//! <indent><comment> ~/~ end <<doc.md#name>>[init|N]<close?>
//! ```
//!
//! `init` tags the first fragment of a nested reference; it implies index 0
//! and tells the stitcher to restore the `<<name>>` line in the parent.

use std::path::{Path, PathBuf};

use crate::config::{Comment, Markers, ANNOTATION_PREFIX};
use crate::errors::Result;
use crate::model::{Fragment, ReferenceId, ReferenceName};
use crate::pattern::{Match, Matcher, MatcherExt, Pattern};

/// Placeholder origin for fragments that were not read from a document.
const UNKNOWN_ORIGIN: &str = "-";

/// A parsed begin marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMarker {
    pub indent: String,
    pub origin: PathBuf,
    pub id: ReferenceId,
    pub is_init: bool,
}

/// A parsed end marker. The label is absent in the short `~/~ end` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseMarker {
    pub indent: String,
    pub label: Option<(PathBuf, ReferenceId)>,
}

/// Marker formatting and recognition for one comment style.
///
/// All patterns are built from the comment delimiters and marker words at
/// runtime and go through the pattern cache, so constructing the syntax for
/// the same language twice compiles nothing new.
#[derive(Debug)]
pub struct AnnotationSyntax {
    comment: Comment,
    markers: Markers,
    open: Box<dyn Matcher>,
    close: Box<dyn Matcher>,
    loose: Box<dyn Matcher>,
}

impl AnnotationSyntax {
    pub fn new(comment: &Comment, markers: &Markers) -> Result<Self> {
        let forbidden = regex::escape(&markers.forbidden_label_chars());
        let label = format!(
            r"{}(?P<source>[^{f}]+)#(?P<name>[^{f}]+){}",
            regex::escape(&markers.open),
            regex::escape(&markers.close),
            f = forbidden,
        );
        let tail = match comment.close() {
            Some(close) => format!(r"\s*(?:{})?\s*", regex::escape(close)),
            None => r"\s*".to_string(),
        };
        let prefix = || -> Result<_> {
            Ok(Pattern::new(r"(?P<indent>[ \t]*)")?.then(Pattern::literal(comment.open())?))
        };
        let tag = || -> Result<_> {
            Ok(Pattern::new(r"\[(?P<index>\d+)\]")?.or(Pattern::new(r"\[(?P<init>init)\]")?))
        };

        let open = prefix()?
            .then(Pattern::new(format!(
                r"\s+{}\s+{}\s+{}",
                regex::escape(ANNOTATION_PREFIX),
                regex::escape(&markers.begin),
                label
            ))?)
            .then(tag()?)
            .then(Pattern::new(tail.clone())?)
            .boxed();

        let close = prefix()?
            .then(Pattern::new(format!(
                r"\s+{}\s+{}",
                regex::escape(ANNOTATION_PREFIX),
                regex::escape(&markers.end)
            ))?)
            .then(
                Pattern::new(format!(r"\s+{}", label))?
                    .then(tag()?)
                    .or(Pattern::new("")?),
            )
            .then(Pattern::new(tail)?)
            .boxed();

        let loose = prefix()?
            .then(Pattern::new(format!(
                r"\s+{}\s+(?:{}|{})(?:\s|$)",
                regex::escape(ANNOTATION_PREFIX),
                regex::escape(&markers.begin),
                regex::escape(&markers.end)
            ))?)
            .boxed();

        Ok(Self {
            comment: comment.clone(),
            markers: markers.clone(),
            open,
            close,
            loose,
        })
    }

    pub fn comment(&self) -> &Comment {
        &self.comment
    }

    /// Recognizes a begin marker line.
    pub fn parse_open(&self, line: &str) -> Option<OpenMarker> {
        let m = self.open.match_full(line)?;
        let (origin, id, is_init) = read_label(m.get("source")?, m.get("name")?, &m)?;
        Some(OpenMarker {
            indent: m.get("indent").unwrap_or_default().to_string(),
            origin,
            id,
            is_init,
        })
    }

    /// Recognizes an end marker line.
    pub fn parse_close(&self, line: &str) -> Option<CloseMarker> {
        let m = self.close.match_full(line)?;
        let label = match (m.get("source"), m.get("name")) {
            (Some(source), Some(name)) => {
                let (origin, id, _) = read_label(source, name, &m)?;
                Some((origin, id))
            }
            _ => None,
        };
        Some(CloseMarker {
            indent: m.get("indent").unwrap_or_default().to_string(),
            label,
        })
    }

    /// Whether `line` starts like a begin or end marker, whatever follows.
    ///
    /// A line for which this holds but neither [`Self::parse_open`] nor
    /// [`Self::parse_close`] succeeds is a damaged marker.
    pub fn looks_like_marker(&self, line: &str) -> bool {
        self.loose.match_prefix(line).is_some()
    }

    /// The begin marker for `fragment`, without indentation.
    pub fn format_open(&self, fragment: &Fragment, is_init: bool) -> String {
        self.format(&self.markers.begin, fragment, is_init)
    }

    /// The end marker for `fragment`, without indentation.
    pub fn format_close(&self, fragment: &Fragment, is_init: bool) -> String {
        self.format(&self.markers.end, fragment, is_init)
    }

    fn format(&self, word: &str, fragment: &Fragment, is_init: bool) -> String {
        let origin = fragment
            .origin()
            .map(origin_label)
            .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string());
        let tag = if is_init {
            "init".to_string()
        } else {
            fragment.id.index.to_string()
        };
        self.comment.wrap(&format!(
            "{} {} {}{}#{}{}[{}]",
            ANNOTATION_PREFIX,
            word,
            self.markers.open,
            origin,
            fragment.id.name,
            self.markers.close,
            tag
        ))
    }
}

/// Decodes the `<<source#name>>[tag]` part of a marker.
fn read_label(source: &str, name: &str, m: &Match<'_>) -> Option<(PathBuf, ReferenceId, bool)> {
    let name = ReferenceName::new(name);
    if m.get("init").is_some() {
        return Some((PathBuf::from(source), ReferenceId::first(name), true));
    }
    let index = m.get("index")?.parse().ok()?;
    Some((PathBuf::from(source), ReferenceId::new(name, index), false))
}

fn origin_label(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_fragment;
    use pretty_assertions::assert_eq;

    fn python() -> AnnotationSyntax {
        AnnotationSyntax::new(&Comment::line("#"), &Markers::default()).unwrap()
    }

    #[test]
    fn test_format_open_and_close() {
        let syntax = python();
        let fragment = make_fragment("main", "pass\n");

        assert_eq!(
            syntax.format_open(&fragment, false),
            "# ~/~ begin <<doc.md#main>>[0]"
        );
        assert_eq!(
            syntax.format_close(&fragment, true),
            "# ~/~ end <<doc.md#main>>[init]"
        );
    }

    #[test]
    fn test_parse_open() {
        let marker = python()
            .parse_open("    # ~/~ begin <<docs/a b.md#inner>>[2]")
            .unwrap();

        assert_eq!(marker.indent, "    ");
        assert_eq!(marker.origin, PathBuf::from("docs/a b.md"));
        assert_eq!(marker.id, ReferenceId::new(ReferenceName::new("inner"), 2));
        assert!(!marker.is_init);
    }

    #[test]
    fn test_parse_init() {
        let marker = python().parse_open("# ~/~ begin <<a.md#x>>[init]").unwrap();
        assert!(marker.is_init);
        assert_eq!(marker.id.index, 0);
    }

    #[test]
    fn test_parse_close_forms() {
        let syntax = python();

        let full = syntax.parse_close("  # ~/~ end <<a.md#x>>[3]").unwrap();
        assert_eq!(full.indent, "  ");
        let (origin, id) = full.label.unwrap();
        assert_eq!(origin, PathBuf::from("a.md"));
        assert_eq!(id.index, 3);

        let short = syntax.parse_close("  # ~/~ end").unwrap();
        assert_eq!(short.indent, "  ");
        assert!(short.label.is_none());
    }

    #[test]
    fn test_ordinary_lines_are_not_markers() {
        let syntax = python();
        assert!(syntax.parse_open("print('hello')").is_none());
        assert!(syntax.parse_open("# ~/~ begin <<a.md#x>>").is_none());
        assert!(syntax.parse_close("# ~/~ endless").is_none());
        assert!(syntax.parse_close("# ~/~ begin <<a.md#x>>[0]").is_none());
        assert!(syntax.parse_open("// ~/~ begin <<a.md#x>>[0]").is_none());
    }

    #[test]
    fn test_damaged_markers_look_like_markers() {
        let syntax = python();
        assert!(syntax.looks_like_marker("# ~/~ begin <<a.md#x>>[1a]"));
        assert!(syntax.looks_like_marker("  # ~/~ end <<a.md#x>"));
        assert!(syntax.looks_like_marker("# ~/~ begin"));
        assert!(syntax.looks_like_marker("# ~/~ end"));

        assert!(!syntax.looks_like_marker("# ~/~ endless"));
        assert!(!syntax.looks_like_marker("# a comment about ~/~ begin"));
        assert!(!syntax.looks_like_marker("x = '~/~ begin'"));
        assert!(!syntax.looks_like_marker("// ~/~ begin <<a.md#x>>[0]"));
    }

    #[test]
    fn test_block_comment_roundtrip() {
        let syntax =
            AnnotationSyntax::new(&Comment::block("/*", "*/"), &Markers::default()).unwrap();
        let fragment = make_fragment("style", "");

        let open = syntax.format_open(&fragment, false);
        assert_eq!(open, "/* ~/~ begin <<doc.md#style>>[0] */");
        assert_eq!(syntax.parse_open(&open).unwrap().id.name.as_str(), "style");

        let close = syntax.format_close(&fragment, false);
        assert!(syntax.parse_close(&close).unwrap().label.is_some());
        assert!(syntax.parse_close("/* ~/~ end */").unwrap().label.is_none());
    }

    #[test]
    fn test_custom_markers() {
        let markers = Markers::new("[[", "]]", "start", "stop");
        let syntax = AnnotationSyntax::new(&Comment::line("--"), &markers).unwrap();
        let fragment = make_fragment("query", "");

        let open = syntax.format_open(&fragment, false);
        assert_eq!(open, "-- ~/~ start [[doc.md#query]][0]");
        assert!(syntax.parse_open(&open).is_some());
        assert!(syntax
            .parse_open("-- ~/~ begin <<doc.md#query>>[0]")
            .is_none());
    }
}
