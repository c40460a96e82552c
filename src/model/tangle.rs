//! Recursive expansion of fragment references.
//!
//! A line consisting only of `<<name>>` (optionally indented) is replaced by
//! the expansion of `name`, every produced line prefixed with the reference's
//! indentation on top of the indentation already in effect. References
//! embedded mid-line are substituted in place and never annotated.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::fragment::Fragment;
use super::reference_map::ReferenceMap;
use super::reference_name::{ReferenceName, NAME_CHAR_CLASS};
use crate::annotation::AnnotationSyntax;
use crate::errors::{EntangledError, Result};
use crate::pattern::{compile_cached, Matcher, Pattern};
use crate::text_location::TextLocation;

/// A reference occupying its own line.
static REFERENCE_LINE: Lazy<Pattern> = Lazy::new(|| {
    Pattern::new(&format!(r"(?P<indent>\s*)<<(?P<refname>{}+)>>\s*", NAME_CHAR_CLASS)).unwrap()
});

/// A reference anywhere in a line.
static INLINE_REFERENCE: Lazy<Arc<Regex>> =
    Lazy::new(|| compile_cached(&format!(r"<<(?P<refname>{}+)>>", NAME_CHAR_CLASS)).unwrap());

/// Tracks the chain of names being expanded.
#[derive(Debug, Clone, Default)]
pub struct CycleDetector {
    stack: Vec<ReferenceName>,
    active: HashSet<ReferenceName>,
}

impl CycleDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `name`, failing with the full cycle path if it is already
    /// being expanded.
    pub fn enter(&mut self, name: &ReferenceName) -> Result<()> {
        if self.active.contains(name) {
            let start = self.stack.iter().position(|n| n == name).unwrap_or(0);
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(name.clone());
            return Err(EntangledError::CyclicReference(cycle));
        }
        self.active.insert(name.clone());
        self.stack.push(name.clone());
        Ok(())
    }

    pub fn exit(&mut self) {
        if let Some(name) = self.stack.pop() {
            self.active.remove(&name);
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// How fragment boundaries show up in the output.
#[derive(Debug, Clone, Copy)]
pub enum Annotation<'a> {
    /// Begin/end markers around every fragment occurrence.
    Markers(&'a AnnotationSyntax),
    /// Nothing but the code.
    Naked,
    /// A blank line between fragments, runs of blank lines collapsed.
    Bare,
}

/// One line of expanded output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine<'a> {
    pub indent: Arc<str>,
    pub text: Cow<'a, str>,
}

impl OutputLine<'_> {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length in bytes once rendered, including the newline.
    pub fn rendered_len(&self) -> usize {
        if self.text.is_empty() {
            1
        } else {
            self.indent.len() + self.text.len() + 1
        }
    }

    /// Appends the line to `out`. Empty lines get no indentation.
    pub fn write_to(&self, out: &mut String) {
        if !self.text.is_empty() {
            out.push_str(&self.indent);
            out.push_str(&self.text);
        }
        out.push('\n');
    }
}

/// The result of expanding one name.
#[derive(Debug, Clone, Default)]
pub struct Expansion<'a> {
    pub lines: Vec<OutputLine<'a>>,
    /// Documents the expansion read from.
    pub dependencies: BTreeSet<PathBuf>,
}

impl Expansion<'_> {
    /// Renders all lines with a single allocation.
    pub fn into_text(self) -> String {
        let len = self.lines.iter().map(OutputLine::rendered_len).sum();
        let mut out = String::with_capacity(len);
        for line in &self.lines {
            line.write_to(&mut out);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

struct Walk {
    detector: CycleDetector,
    dependencies: BTreeSet<PathBuf>,
}

/// Expands references against a read-only [`ReferenceMap`].
#[derive(Debug, Clone, Copy)]
pub struct Tangler<'a> {
    refs: &'a ReferenceMap,
    annotation: Annotation<'a>,
}

impl<'a> Tangler<'a> {
    pub fn new(refs: &'a ReferenceMap, annotation: Annotation<'a>) -> Self {
        Self { refs, annotation }
    }

    pub fn naked(refs: &'a ReferenceMap) -> Self {
        Self::new(refs, Annotation::Naked)
    }

    /// Expands `name` with every line prefixed by `indent`.
    ///
    /// With `top_level` unset the expansion is treated as nested inside a
    /// parent, so its first fragment is tagged `init` when annotated.
    pub fn expand(
        &self,
        name: &ReferenceName,
        indent: &str,
        top_level: bool,
    ) -> Result<Expansion<'a>> {
        let mut walk = Walk {
            detector: CycleDetector::new(),
            dependencies: BTreeSet::new(),
        };
        let mut lines = Vec::new();
        self.expand_into(name, &Arc::from(indent), top_level, None, None, &mut lines, &mut walk)?;

        if matches!(self.annotation, Annotation::Bare) {
            collapse_blank_lines(&mut lines);
        }
        tracing::debug!(
            "expanded <<{}>>: {} lines from {} documents",
            name,
            lines.len(),
            walk.dependencies.len()
        );
        Ok(Expansion {
            lines,
            dependencies: walk.dependencies,
        })
    }

    /// Expands `name` at top level into text and the documents it depends on.
    pub fn expand_to_text(&self, name: &ReferenceName) -> Result<(String, BTreeSet<PathBuf>)> {
        let expansion = self.expand(name, "", true)?;
        let dependencies = expansion.dependencies.clone();
        Ok((expansion.into_text(), dependencies))
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_into(
        &self,
        name: &ReferenceName,
        indent: &Arc<str>,
        top_level: bool,
        caller: Option<&Path>,
        referenced_at: Option<&TextLocation>,
        out: &mut Vec<OutputLine<'a>>,
        walk: &mut Walk,
    ) -> Result<()> {
        walk.detector.enter(name)?;
        let fragments = self.refs.resolve(name).map_err(|e| match e {
            EntangledError::UndefinedReference { name, .. } => EntangledError::UndefinedReference {
                name,
                location: referenced_at.cloned(),
            },
            other => other,
        })?;

        for (i, fragment) in fragments.into_iter().enumerate() {
            if let Some(origin) = fragment.origin() {
                if caller != Some(origin) {
                    walk.dependencies.insert(origin.to_path_buf());
                }
            }
            let is_init = !top_level && i == 0;

            match self.annotation {
                Annotation::Markers(syntax) => out.push(OutputLine {
                    indent: indent.clone(),
                    text: Cow::Owned(syntax.format_open(fragment, is_init)),
                }),
                Annotation::Bare => out.push(blank(indent)),
                Annotation::Naked => {}
            }

            self.expand_fragment(fragment, indent, out, walk)?;

            match self.annotation {
                Annotation::Markers(syntax) => out.push(OutputLine {
                    indent: indent.clone(),
                    text: Cow::Owned(syntax.format_close(fragment, is_init)),
                }),
                Annotation::Bare => out.push(blank(indent)),
                Annotation::Naked => {}
            }
        }

        walk.detector.exit();
        Ok(())
    }

    fn expand_fragment(
        &self,
        fragment: &'a Fragment,
        indent: &Arc<str>,
        out: &mut Vec<OutputLine<'a>>,
        walk: &mut Walk,
    ) -> Result<()> {
        for (offset, line) in fragment.lines.iter().enumerate() {
            if let Some(m) = REFERENCE_LINE.match_full(line) {
                let inner: Arc<str> =
                    format!("{}{}", indent, m.get("indent").unwrap_or_default()).into();
                let refname = ReferenceName::new(m.get("refname").unwrap_or_default());
                let location = fragment.location.offset(offset);
                self.expand_into(
                    &refname,
                    &inner,
                    false,
                    fragment.origin(),
                    Some(&location),
                    out,
                    walk,
                )?;
            } else if line.contains("<<") && INLINE_REFERENCE.is_match(line) {
                self.substitute_inline(fragment, offset, indent, out, walk)?;
            } else {
                out.push(OutputLine {
                    indent: indent.clone(),
                    text: Cow::Borrowed(line.as_str()),
                });
            }
        }
        Ok(())
    }

    /// Replaces every `<<name>>` in a line by its naked expansion. Multi-line
    /// expansions continue on new lines at the line's own indentation.
    fn substitute_inline(
        &self,
        fragment: &'a Fragment,
        offset: usize,
        indent: &Arc<str>,
        out: &mut Vec<OutputLine<'a>>,
        walk: &mut Walk,
    ) -> Result<()> {
        let line = &fragment.lines[offset];
        let leading = &line[..line.len() - line.trim_start().len()];
        let naked = Tangler::naked(self.refs);
        let location = fragment.location.offset(offset);
        let empty: Arc<str> = Arc::from("");

        let mut pieces = vec![String::new()];
        let mut last = 0;
        for caps in INLINE_REFERENCE.captures_iter(line) {
            let (Some(whole), Some(refname)) = (caps.get(0), caps.name("refname")) else {
                continue;
            };
            push_piece(&mut pieces, &line[last..whole.start()]);

            let mut inner = Vec::new();
            naked.expand_into(
                &ReferenceName::new(refname.as_str()),
                &empty,
                false,
                fragment.origin(),
                Some(&location),
                &mut inner,
                walk,
            )?;
            for (k, inner_line) in inner.iter().enumerate() {
                if k > 0 {
                    pieces.push(leading.to_string());
                }
                push_piece(&mut pieces, &inner_line.text);
            }
            last = whole.end();
        }
        push_piece(&mut pieces, &line[last..]);

        out.extend(pieces.into_iter().map(|text| OutputLine {
            indent: indent.clone(),
            text: Cow::Owned(text),
        }));
        Ok(())
    }
}

fn push_piece(pieces: &mut [String], text: &str) {
    if let Some(current) = pieces.last_mut() {
        current.push_str(text);
    }
}

fn blank<'a>(indent: &Arc<str>) -> OutputLine<'a> {
    OutputLine {
        indent: indent.clone(),
        text: Cow::Borrowed(""),
    }
}

/// Collapses runs of blank lines into one and trims blank lines at both ends.
fn collapse_blank_lines(lines: &mut Vec<OutputLine<'_>>) {
    let mut previous_blank = true;
    lines.retain(|line| {
        let keep = !(line.is_blank() && previous_blank);
        previous_blank = line.is_blank();
        keep
    });
    while lines.last().is_some_and(OutputLine::is_blank) {
        lines.pop();
    }
}

/// True when a line embeds a reference that is not on a line of its own.
pub fn has_inline_reference(line: &str) -> bool {
    REFERENCE_LINE.match_full(line).is_none() && INLINE_REFERENCE.is_match(line)
}

/// Names referenced from `lines`, in order of appearance.
pub fn referenced_names(lines: &[String]) -> Vec<ReferenceName> {
    lines
        .iter()
        .flat_map(|line| INLINE_REFERENCE.captures_iter(line))
        .filter_map(|caps| caps.name("refname"))
        .map(|m| ReferenceName::new(m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Comment, Markers};
    use crate::test_utils::{make_fragment, make_fragment_in};
    use pretty_assertions::assert_eq;

    fn naked(refs: &ReferenceMap, name: &str) -> Result<String> {
        Tangler::naked(refs)
            .expand_to_text(&ReferenceName::new(name))
            .map(|(text, _)| text)
    }

    fn python() -> AnnotationSyntax {
        AnnotationSyntax::new(&Comment::line("#"), &Markers::default()).unwrap()
    }

    #[test]
    fn test_simple() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("main", "print('hello')\nprint('world')\n"));
        assert_eq!(naked(&refs, "main").unwrap(), "print('hello')\nprint('world')\n");
    }

    #[test]
    fn test_fragments_concatenate_in_order() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("main", "line1\n"));
        refs.register(make_fragment("main", "line2\n"));
        assert_eq!(naked(&refs, "main").unwrap(), "line1\nline2\n");
    }

    #[test]
    fn test_indentation_compounds() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("main", "class A:\n    <<method>>\n"));
        refs.register(make_fragment("method", "def f(self):\n  <<body>>\n\n  return\n"));
        refs.register(make_fragment("body", "pass\n"));

        assert_eq!(
            naked(&refs, "main").unwrap(),
            "class A:\n    def f(self):\n      pass\n\n      return\n"
        );
    }

    #[test]
    fn test_expand_with_base_indent() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("body", "x = 1\n"));

        let expansion = Tangler::naked(&refs)
            .expand(&ReferenceName::new("body"), "    ", true)
            .unwrap();
        assert_eq!(expansion.lines[0].indent.as_ref(), "    ");
        assert_eq!(expansion.into_text(), "    x = 1\n");
    }

    #[test]
    fn test_inline_reference() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment_in("greet", "  <<name>>!\n", "a.md"));
        refs.register(make_fragment_in("name", "World\n", "b.md"));

        let (text, deps) = Tangler::naked(&refs)
            .expand_to_text(&ReferenceName::new("greet"))
            .unwrap();
        assert_eq!(text, "  World!\n");
        assert_eq!(
            deps,
            BTreeSet::from([PathBuf::from("a.md"), PathBuf::from("b.md")])
        );
    }

    #[test]
    fn test_inline_reference_multiline() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("call", "    f(<<args>>)\n"));
        refs.register(make_fragment("args", "a,\nb\n"));

        assert_eq!(naked(&refs, "call").unwrap(), "    f(a,\n    b)\n");
    }

    #[test]
    fn test_cycle_detected() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("a", "<<b>>\n"));
        refs.register(make_fragment("b", "  <<a>>\n"));

        match naked(&refs, "a") {
            Err(EntangledError::CyclicReference(path)) => {
                let names: Vec<_> = path.iter().map(|n| n.as_str()).collect();
                assert_eq!(names, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_through_inline() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("a", "x = <<a>>\n"));
        assert!(matches!(
            naked(&refs, "a"),
            Err(EntangledError::CyclicReference(_))
        ));
    }

    #[test]
    fn test_repeated_reference_is_not_a_cycle() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("main", "<<x>>\n<<x>>\n"));
        refs.register(make_fragment("x", "x\n"));
        assert_eq!(naked(&refs, "main").unwrap(), "x\nx\n");
    }

    #[test]
    fn test_undefined_reference() {
        let refs = ReferenceMap::new();
        match naked(&refs, "nonexistent") {
            Err(EntangledError::UndefinedReference { name, location }) => {
                assert_eq!(name.as_str(), "nonexistent");
                assert!(location.is_none());
            }
            other => panic!("expected undefined reference, got {:?}", other),
        }
    }

    #[test]
    fn test_undefined_nested_reference_has_location() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("main", "first\n<<missing>>\n"));

        match naked(&refs, "main") {
            Err(EntangledError::UndefinedReference { name, location }) => {
                assert_eq!(name.as_str(), "missing");
                let location = location.unwrap();
                assert_eq!(location.line, 2);
                assert_eq!(location.filename, Some(PathBuf::from("doc.md")));
            }
            other => panic!("expected undefined reference, got {:?}", other),
        }
    }

    #[test]
    fn test_dependencies_across_documents() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment_in("main", "<<util>>\n<<local>>\n", "main.md"));
        refs.register(make_fragment_in("local", "l\n", "main.md"));
        refs.register(make_fragment_in("util", "u\n", "lib/util.md"));

        let expansion = Tangler::naked(&refs)
            .expand(&ReferenceName::new("main"), "", true)
            .unwrap();
        assert_eq!(
            expansion.dependencies,
            BTreeSet::from([PathBuf::from("lib/util.md"), PathBuf::from("main.md")])
        );
    }

    #[test]
    fn test_annotated() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("main", "def main():\n    <<body>>\n"));
        refs.register(make_fragment("body", "x = 1\n"));
        refs.register(make_fragment("body", "\nreturn x\n"));

        let syntax = python();
        let (text, _) = Tangler::new(&refs, Annotation::Markers(&syntax))
            .expand_to_text(&ReferenceName::new("main"))
            .unwrap();

        assert_eq!(
            text,
            "\
# ~/~ begin <<doc.md#main>>[0]
def main():
    # ~/~ begin <<doc.md#body>>[init]
    x = 1
    # ~/~ end <<doc.md#body>>[init]
    # ~/~ begin <<doc.md#body>>[1]

    return x
    # ~/~ end <<doc.md#body>>[1]
# ~/~ end <<doc.md#main>>[0]
"
        );
    }

    #[test]
    fn test_inline_references_not_annotated() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("main", "x = <<value>>\n"));
        refs.register(make_fragment("value", "42\n"));

        let syntax = python();
        let (text, _) = Tangler::new(&refs, Annotation::Markers(&syntax))
            .expand_to_text(&ReferenceName::new("main"))
            .unwrap();
        assert_eq!(
            text,
            "# ~/~ begin <<doc.md#main>>[0]\nx = 42\n# ~/~ end <<doc.md#main>>[0]\n"
        );
    }

    #[test]
    fn test_bare() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("main", "line1\n\n"));
        refs.register(make_fragment("main", "<<other>>\n"));
        refs.register(make_fragment("other", "line2\n"));

        let (text, _) = Tangler::new(&refs, Annotation::Bare)
            .expand_to_text(&ReferenceName::new("main"))
            .unwrap();
        assert_eq!(text, "line1\n\nline2\n");
    }

    #[test]
    fn test_into_text_allocates_once() {
        let mut refs = ReferenceMap::new();
        let body: String = (0..1000).map(|i| format!("line {}\n", i)).collect();
        refs.register(make_fragment("main", "    <<body>>\n"));
        refs.register(make_fragment("body", &body));

        let expansion = Tangler::naked(&refs)
            .expand(&ReferenceName::new("main"), "", true)
            .unwrap();
        let expected: usize = expansion.lines.iter().map(OutputLine::rendered_len).sum();
        let text = expansion.into_text();
        assert_eq!(text.len(), expected);
        assert_eq!(text.capacity(), expected);
    }

    #[test]
    fn test_name_with_plus() {
        let mut refs = ReferenceMap::new();
        refs.register(make_fragment("main", "<<a+b>>\nx = <<c++>>\n"));
        refs.register(make_fragment("a+b", "body\n"));
        refs.register(make_fragment("c++", "1\n"));
        assert_eq!(naked(&refs, "main").unwrap(), "body\nx = 1\n");

        let lines = vec!["<<missing+one>>".to_string()];
        assert_eq!(referenced_names(&lines)[0].as_str(), "missing+one");
    }

    #[test]
    fn test_has_inline_reference() {
        assert!(has_inline_reference("x = <<value>>;"));
        assert!(!has_inline_reference("    <<value>>"));
        assert!(!has_inline_reference("x << 2"));
    }

    #[test]
    fn test_referenced_names() {
        let lines = vec!["<<a>>".to_string(), "f(<<b>>, <<c>>)".to_string()];
        let names: Vec<_> = referenced_names(&lines)
            .into_iter()
            .map(|n| n.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
