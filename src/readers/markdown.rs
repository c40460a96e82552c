//! Markdown reader: splits a document into prose and fenced code fragments.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::document::{Document, RawBody};
use crate::errors::{EntangledError, Result};
use crate::model::{Fragment, Properties, ReferenceMap, ReferenceName};
use crate::pattern::compile_cached;
use crate::text_location::TextLocation;

/// Opening fence: at least three backticks or tildes followed by the info string.
static FENCE_OPEN: Lazy<Arc<Regex>> = Lazy::new(|| {
    compile_cached(r"^(?P<indent>[ \t]*)(?P<fence>`{3,}|~{3,})(?P<info>[^`]*)$").unwrap()
});

/// Closing fence for `fence`: the same character, at least as many times.
fn fence_close(fence: &str) -> Result<Arc<Regex>> {
    let c = fence.chars().next().unwrap_or('`');
    compile_cached(&format!(
        r"^[ \t]*{}{{{},}}\s*$",
        regex::escape(&c.to_string()),
        fence.len()
    ))
}

/// `line` without its `\n` or `\r\n` terminator.
fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// The terminator of the first line, `\n` when there is none.
fn detect_newline(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if text[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

struct OpenFence<'t> {
    indent: &'t str,
    info: &'t str,
    close: Arc<Regex>,
    line: usize,
    body: RawBody,
}

enum Block {
    Prose(String),
    Code(Fragment, String, RawBody),
}

/// Reads a markdown document, registering every code block in `refs`.
///
/// Fence lines and everything outside code blocks become prose; each code
/// block body becomes a fragment reference. Blocks with neither an `#id` nor
/// a `file=` attribute are registered under a generated anonymous name.
/// Nothing is registered when the document fails to parse.
///
/// Prose and unedited code blocks keep their exact bytes, so rendering the
/// document again reproduces `text`.
pub fn read_markdown(
    path: &Path,
    text: &str,
    config: &Config,
    refs: &mut ReferenceMap,
) -> Result<Document> {
    let mut blocks = Vec::new();
    let mut prose = String::new();
    let mut anonymous = 0;
    let mut open: Option<OpenFence<'_>> = None;

    for (index, raw) in text.split_inclusive('\n').enumerate() {
        let line_number = index + 1;
        let line = strip_terminator(raw);

        match open.take() {
            None => {
                if let Some(caps) = FENCE_OPEN.captures(line) {
                    let fence = caps.name("fence").map_or("```", |m| m.as_str());
                    open = Some(OpenFence {
                        indent: caps.name("indent").map_or("", |m| m.as_str()),
                        info: caps.name("info").map_or("", |m| m.as_str()),
                        close: fence_close(fence)?,
                        line: line_number,
                        body: RawBody::default(),
                    });
                }
                prose.push_str(raw);
            }
            Some(mut fence) if !fence.close.is_match(line) => {
                let content = match line.strip_prefix(fence.indent) {
                    Some(rest) => rest,
                    None if line.trim().is_empty() => "",
                    None => line,
                };
                fence.body.lines.push(content.to_string());
                fence.body.text.push_str(raw);
                open = Some(fence);
            }
            Some(fence) => {
                blocks.push(Block::Prose(std::mem::take(&mut prose)));

                let location = TextLocation::file_line(path, fence.line + 1);
                let lines = fence.body.lines.clone();
                let fragment =
                    make_fragment(path, fence.info, lines, location, &mut anonymous, config);
                blocks.push(Block::Code(fragment, fence.indent.to_string(), fence.body));

                prose.push_str(raw);
            }
        }
    }

    if let Some(fence) = open {
        return Err(EntangledError::Parse {
            location: TextLocation::file_line(path, fence.line),
            message: "unclosed code block".to_string(),
        });
    }
    blocks.push(Block::Prose(prose));

    let mut document = Document::new(path.to_path_buf());
    document.set_newline(detect_newline(text));
    for block in blocks {
        match block {
            Block::Prose(text) => document.push_prose(text),
            Block::Code(fragment, indent, body) => {
                let id = refs.register(fragment);
                document.push_fragment(id, indent, body);
            }
        }
    }
    tracing::debug!(
        "read {}: {} fragments",
        path.display(),
        document.fragment_ids().count()
    );
    Ok(document)
}

fn make_fragment(
    path: &Path,
    info: &str,
    lines: Vec<String>,
    location: TextLocation,
    anonymous: &mut usize,
    config: &Config,
) -> Fragment {
    let props = match Properties::parse(info) {
        Ok(props) => props,
        Err(e) => {
            tracing::warn!("{}: {}; treating the block as anonymous", location, e);
            Properties::default()
        }
    };

    let language = props.language().map(str::to_string);
    if let Some(lang) = &language {
        if config.find_language(lang).is_none() {
            tracing::debug!("{}: unknown language `{}`", location, lang);
        }
    }

    let name = match (props.id(), props.file()) {
        (Some(id), _) => ReferenceName::new(id),
        (None, Some(file)) => ReferenceName::from_file_path(file),
        (None, None) => {
            *anonymous += 1;
            ReferenceName::anonymous(&path.to_string_lossy(), *anonymous - 1)
        }
    };

    let mut fragment = Fragment::new(name, language, lines, location);
    if let Some(file) = props.file() {
        fragment = fragment.with_target(PathBuf::from(file));
    }
    for (key, value) in props.attributes().filter(|(k, _)| *k != "file") {
        fragment = fragment.with_attribute(key.to_string(), value.to_string());
    }
    fragment
}
