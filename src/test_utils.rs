//! Shared test utilities.

use std::path::PathBuf;

use crate::model::{Fragment, ReferenceName};
use crate::text_location::TextLocation;

/// Creates a python fragment originating from `doc.md`.
pub fn make_fragment(name: &str, source: &str) -> Fragment {
    make_fragment_in(name, source, "doc.md")
}

/// Creates a python fragment originating from the given document.
pub fn make_fragment_in(name: &str, source: &str, document: &str) -> Fragment {
    Fragment::from_source(
        ReferenceName::new(name),
        Some("python".to_string()),
        source,
        TextLocation::file_line(document, 1),
    )
}

/// Creates a python fragment that declares an output file.
pub fn make_fragment_with_target(name: &str, source: &str, target: &str) -> Fragment {
    make_fragment(name, source).with_target(PathBuf::from(target))
}
