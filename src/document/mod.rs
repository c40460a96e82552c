//! Documents as ordered prose and fragment content.

mod model;

use std::path::{Path, PathBuf};

use crate::model::ReferenceId;

pub use model::DocumentModel;

/// One piece of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Text outside code blocks, fence lines included, with the original
    /// line terminators.
    Prose(String),
    /// The body of a code block, stored in the reference map.
    Fragment {
        id: ReferenceId,
        indent: String,
        source: RawBody,
    },
}

/// A code block body as it was read.
///
/// `lines` is what the block was split into. As long as the fragment still
/// holds exactly these lines, `text` is written back instead of re-indenting
/// them, so trailing whitespace and line terminators survive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBody {
    pub text: String,
    pub lines: Vec<String>,
}

/// A source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    content: Vec<Content>,
    newline: &'static str,
}

impl Document {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            content: Vec::new(),
            newline: "\n",
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &[Content] {
        &self.content
    }

    /// Appends prose, merging with preceding prose. Empty text is dropped.
    pub fn push_prose(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        match self.content.last_mut() {
            Some(Content::Prose(previous)) => previous.push_str(&text),
            _ => self.content.push(Content::Prose(text)),
        }
    }

    pub fn push_fragment(&mut self, id: ReferenceId, indent: String, source: RawBody) {
        self.content.push(Content::Fragment { id, indent, source });
    }

    /// Line terminator used for code lines that changed since reading.
    pub fn newline(&self) -> &'static str {
        self.newline
    }

    pub fn set_newline(&mut self, newline: &'static str) {
        self.newline = newline;
    }

    /// Ids of the fragments in this document, in order.
    pub fn fragment_ids(&self) -> impl Iterator<Item = &ReferenceId> {
        self.content.iter().filter_map(|c| match c {
            Content::Fragment { id, .. } => Some(id),
            Content::Prose(_) => None,
        })
    }
}
