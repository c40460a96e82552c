//! The document model: every loaded document plus the shared reference map.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::{Content, Document};
use crate::annotation::{read_fragments_from, AnnotationSyntax, StitchedFragment};
use crate::config::{AnnotationMethod, Config};
use crate::errors::{EntangledError, Result};
use crate::model::tangle::{has_inline_reference, referenced_names};
use crate::model::{Annotation, ReferenceId, ReferenceMap, ReferenceName, Tangler};
use crate::readers::read_markdown;
use crate::text_location::TextLocation;

/// Documents in load order and the fragments they define.
#[derive(Debug, Clone, Default)]
pub struct DocumentModel {
    documents: IndexMap<PathBuf, Document>,
    refs: ReferenceMap,
}

impl DocumentModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a markdown document into the model.
    pub fn load_markdown(
        &mut self,
        path: impl AsRef<Path>,
        text: &str,
        config: &Config,
    ) -> Result<&Document> {
        let path = path.as_ref();
        if self.documents.contains_key(path) {
            return Err(EntangledError::Other(format!(
                "{} is already loaded",
                path.display()
            )));
        }
        let document = read_markdown(path, text, config, &mut self.refs)?;
        let (index, _) = self.documents.insert_full(path.to_path_buf(), document);
        Ok(&self.documents[index])
    }

    pub fn refs(&self) -> &ReferenceMap {
        &self.refs
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn document(&self, path: &Path) -> Option<&Document> {
        self.documents.get(path)
    }

    /// Output files declared by the loaded documents.
    pub fn targets(&self) -> Vec<PathBuf> {
        self.refs.targets().cloned().collect()
    }

    fn target_name(&self, target: &Path) -> Result<&ReferenceName> {
        self.refs.get_target_name(target).ok_or_else(|| {
            EntangledError::Other(format!("no code block produces {}", target.display()))
        })
    }

    /// Annotation syntax for a target, from the language of its first fragment.
    pub fn annotation_syntax(&self, target: &Path, config: &Config) -> Result<AnnotationSyntax> {
        let name = self.target_name(target)?;
        let language = self
            .refs
            .resolve(name)?
            .first()
            .and_then(|f| f.language.clone());
        AnnotationSyntax::new(&config.comment_for(language.as_deref()), &config.markers)
    }

    /// The tangled text of `target` and the documents it was assembled from.
    pub fn expand_to_text(
        &self,
        target: &Path,
        config: &Config,
    ) -> Result<(String, BTreeSet<PathBuf>)> {
        let name = self.target_name(target)?;
        match config.annotation {
            AnnotationMethod::Standard => {
                let syntax = self.annotation_syntax(target, config)?;
                Tangler::new(&self.refs, Annotation::Markers(&syntax)).expand_to_text(name)
            }
            AnnotationMethod::Naked => Tangler::naked(&self.refs).expand_to_text(name),
            AnnotationMethod::Bare => {
                Tangler::new(&self.refs, Annotation::Bare).expand_to_text(name)
            }
        }
    }

    /// Reassembles a document from its prose and current fragment content.
    ///
    /// Code blocks whose fragment is unchanged are written exactly as read.
    /// Changed blocks are re-indented, and their empty lines stay empty.
    pub fn render(&self, path: &Path) -> Result<String> {
        let document = self.documents.get(path).ok_or_else(|| {
            EntangledError::Other(format!("{} is not loaded", path.display()))
        })?;

        let mut out = String::new();
        for content in document.content() {
            match content {
                Content::Prose(text) => out.push_str(text),
                Content::Fragment { id, indent, source } => {
                    let fragment = self.refs.get(id).ok_or_else(|| {
                        EntangledError::Other(format!("fragment {} is missing", id))
                    })?;
                    if fragment.lines == source.lines {
                        out.push_str(&source.text);
                        continue;
                    }
                    for line in &fragment.lines {
                        if !line.is_empty() {
                            out.push_str(indent);
                            out.push_str(line);
                        }
                        out.push_str(document.newline());
                    }
                }
            }
        }
        Ok(out)
    }

    /// Reads an annotated target and applies its fragments to the model.
    ///
    /// Returns the documents whose content changed.
    pub fn stitch_text(
        &mut self,
        target: &Path,
        text: &str,
        config: &Config,
    ) -> Result<BTreeSet<PathBuf>> {
        let syntax = self.annotation_syntax(target, config)?;
        let stitched = read_fragments_from(target, text, &syntax)?;
        Ok(self.apply_stitched(stitched))
    }

    /// Replaces fragment content with stitched content.
    ///
    /// Every update is checked before any fragment is touched. Unknown ids and
    /// fragments with inline references are skipped with a warning; when an id
    /// occurs more than once with different content the last one wins.
    pub fn apply_stitched(&mut self, stitched: Vec<StitchedFragment>) -> BTreeSet<PathBuf> {
        let mut updates: HashMap<ReferenceId, StitchedFragment> = HashMap::new();
        let mut order = Vec::new();

        for fragment in stitched {
            let Some(current) = self.refs.get(&fragment.id) else {
                if self.refs.contains_name(&fragment.id.name) {
                    tracing::warn!(
                        "{}: <<{}>> has no occurrence {}, skipping",
                        fragment.location,
                        fragment.id.name,
                        fragment.id.index
                    );
                } else {
                    tracing::warn!(
                        "{}: <<{}>> is not defined in any document, skipping",
                        fragment.location,
                        fragment.id.name
                    );
                }
                continue;
            };
            if current.lines.iter().any(|l| has_inline_reference(l)) {
                tracing::debug!("{} has inline references, not stitching", fragment.id);
                continue;
            }
            if current.origin() != Some(fragment.origin.as_path()) {
                tracing::warn!(
                    "{}: {} claims to come from {}, but is defined elsewhere",
                    fragment.location,
                    fragment.id,
                    fragment.origin.display()
                );
            }

            match updates.get(&fragment.id) {
                Some(previous) if previous.lines != fragment.lines => {
                    tracing::warn!(
                        "{} appears more than once with different content, using {}",
                        fragment.id,
                        fragment.location
                    );
                }
                Some(_) => {}
                None => order.push(fragment.id.clone()),
            }
            updates.insert(fragment.id.clone(), fragment);
        }

        let mut changed = BTreeSet::new();
        for id in order {
            let Some(update) = updates.remove(&id) else {
                continue;
            };
            let unchanged = self
                .refs
                .get(&id)
                .map_or(true, |current| current.lines == update.lines);
            if unchanged {
                continue;
            }
            let origin = self.refs.get(&id).and_then(|f| f.origin().map(Path::to_path_buf));
            if self.refs.update_lines(&id, update.lines) {
                tracing::info!("updated {} from {}", id, update.location);
                changed.extend(origin);
            }
        }
        changed
    }

    /// References to names that no document defines.
    pub fn undefined_references(&self) -> Vec<(ReferenceName, TextLocation)> {
        let names = self.refs.all_names();
        let mut missing = Vec::new();
        for fragment in self.refs.fragments() {
            for (offset, line) in fragment.lines.iter().enumerate() {
                for name in referenced_names(std::slice::from_ref(line)) {
                    if !names.contains(&name) {
                        missing.push((name, fragment.location.offset(offset)));
                    }
                }
            }
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "\
# Hello

```python #main file=hello.py
def main():
    <<body>>

main()
```

The body prints twice:

```python #body
print('hello')
```

```python #body
print('world')
```
";

    fn loaded() -> (DocumentModel, Config) {
        let config = Config::default();
        let mut model = DocumentModel::new();
        model.load_markdown("hello.md", DOC, &config).unwrap();
        (model, config)
    }

    #[test]
    fn test_render_is_lossless() {
        let (model, _) = loaded();
        assert_eq!(model.render(Path::new("hello.md")).unwrap(), DOC);
    }

    #[test]
    fn test_render_keeps_exact_bytes() {
        let config = Config::default();
        let docs = [
            "# Title\r\n\r\n```python #x file=x.py\r\na = 1\r\n\r\nb = 2\r\n```\r\n",
            "```python #x file=x.py\na = 1\n```",
            concat!(
                "- item\n\n    ```python #x file=x.py\n",
                "    a = 1\n    \n  \n      \n    b = 2\n    ```\n",
            ),
        ];
        for (i, doc) in docs.iter().enumerate() {
            let path = format!("doc{}.md", i);
            let mut model = DocumentModel::new();
            model.load_markdown(&path, doc, &config).unwrap();
            assert_eq!(model.render(Path::new(&path)).unwrap(), *doc);
        }
    }

    #[test]
    fn test_render_edited_block_in_crlf_document() {
        let config = Config::default();
        let mut model = DocumentModel::new();
        model
            .load_markdown("a.md", "```python #x file=x.py\r\na = 1\r\n```\r\n", &config)
            .unwrap();
        let (text, _) = model.expand_to_text(Path::new("x.py"), &config).unwrap();

        let edited = text.replace("a = 1", "a = 2");
        model.stitch_text(Path::new("x.py"), &edited, &config).unwrap();
        assert_eq!(
            model.render(Path::new("a.md")).unwrap(),
            "```python #x file=x.py\r\na = 2\r\n```\r\n"
        );
    }

    #[test]
    fn test_expand_target() {
        let (model, mut config) = loaded();
        config.annotation = AnnotationMethod::Naked;

        let (text, deps) = model.expand_to_text(Path::new("hello.py"), &config).unwrap();
        assert_eq!(
            text,
            "def main():\n    print('hello')\n    print('world')\n\nmain()\n"
        );
        assert_eq!(deps, BTreeSet::from([PathBuf::from("hello.md")]));
    }

    #[test]
    fn test_unknown_target() {
        let (model, config) = loaded();
        assert!(model.expand_to_text(Path::new("other.py"), &config).is_err());
    }

    #[test]
    fn test_round_trip_without_edits() {
        let (mut model, config) = loaded();
        let (text, _) = model.expand_to_text(Path::new("hello.py"), &config).unwrap();

        let changed = model.stitch_text(Path::new("hello.py"), &text, &config).unwrap();
        assert!(changed.is_empty());
        assert_eq!(model.render(Path::new("hello.md")).unwrap(), DOC);
    }

    #[test]
    fn test_stitch_edit_back_into_document() {
        let (mut model, config) = loaded();
        let (text, _) = model.expand_to_text(Path::new("hello.py"), &config).unwrap();
        let edited = text
            .replace("print('world')", "print('there')\n    print('world')")
            .replace("main()\n#", "main()  # entry\n#");

        let changed = model.stitch_text(Path::new("hello.py"), &edited, &config).unwrap();
        assert_eq!(changed, BTreeSet::from([PathBuf::from("hello.md")]));

        let rendered = model.render(Path::new("hello.md")).unwrap();
        assert!(rendered.contains("```python #body\nprint('there')\nprint('world')\n```"));
        assert!(rendered.contains("    <<body>>\n\nmain()  # entry\n```"));
    }

    #[test]
    fn test_malformed_stitch_leaves_model_untouched() {
        let (mut model, config) = loaded();
        let (text, _) = model.expand_to_text(Path::new("hello.py"), &config).unwrap();
        let broken = text
            .replace("print('hello')", "print('edited')")
            .replace("# ~/~ end <<hello.md#main>>[0]\n", "");

        assert!(model.stitch_text(Path::new("hello.py"), &broken, &config).is_err());
        assert_eq!(model.render(Path::new("hello.md")).unwrap(), DOC);
    }

    #[test]
    fn test_duplicate_stitched_ids_last_wins() {
        let (mut model, config) = loaded();
        let text = "\
# ~/~ begin <<hello.md#body>>[1]
print('first')
# ~/~ end <<hello.md#body>>[1]
# ~/~ begin <<hello.md#body>>[1]
print('second')
# ~/~ end <<hello.md#body>>[1]
";
        model.stitch_text(Path::new("hello.py"), text, &config).unwrap();
        let id = ReferenceId::new(ReferenceName::new("body"), 1);
        assert_eq!(model.refs().get(&id).unwrap().lines, vec!["print('second')"]);
    }

    #[test]
    fn test_unknown_stitched_fragment_skipped() {
        let (mut model, config) = loaded();
        let text = "# ~/~ begin <<hello.md#gone>>[0]\nx\n# ~/~ end\n";
        let changed = model.stitch_text(Path::new("hello.py"), text, &config).unwrap();
        assert!(changed.is_empty());
    }

    #[test]
    fn test_inline_fragment_not_stitched() {
        let config = Config::default();
        let mut model = DocumentModel::new();
        model
            .load_markdown(
                "a.md",
                "```python #greet file=greet.py\n  <<name>>!\n```\n\n```python #name\nWorld\n```\n",
                &config,
            )
            .unwrap();

        let (text, deps) = model.expand_to_text(Path::new("greet.py"), &config).unwrap();
        assert!(text.contains("\n  World!\n"));
        assert_eq!(deps.len(), 1);

        let edited = text.replace("World!", "Moon!");
        let changed = model.stitch_text(Path::new("greet.py"), &edited, &config).unwrap();
        assert!(changed.is_empty());
    }

    #[test]
    fn test_failed_load_registers_nothing() {
        let config = Config::default();
        let mut model = DocumentModel::new();
        assert!(model
            .load_markdown("bad.md", "```python #a\nx\n```\n```python #b\n", &config)
            .is_err());
        assert!(model.refs().is_empty());
        assert!(model.load_markdown("bad.md", "fine\n", &config).is_ok());
    }

    #[test]
    fn test_undefined_references() {
        let config = Config::default();
        let mut model = DocumentModel::new();
        model
            .load_markdown("a.md", "```python #main\n<<missing>>\n```\n", &config)
            .unwrap();

        let missing = model.undefined_references();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].0.as_str(), "missing");
        assert_eq!(missing[0].1, TextLocation::file_line("a.md", 2));
    }
}
