//! Words and brackets of the annotation marker grammar.

use serde::{Deserialize, Serialize};

/// Tag that identifies annotation comments in generated files.
pub const ANNOTATION_PREFIX: &str = "~/~";

/// Marker vocabulary, configurable under `[markers]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Markers {
    /// Bracket opening the fragment reference.
    #[serde(default = "default_open")]
    pub open: String,

    /// Bracket closing the fragment reference.
    #[serde(default = "default_close")]
    pub close: String,

    /// The word used to mark the beginning of a fragment.
    #[serde(default = "default_begin")]
    pub begin: String,

    /// The word used to mark the end of a fragment.
    #[serde(default = "default_end")]
    pub end: String,
}

fn default_open() -> String {
    "<<".to_string()
}

fn default_close() -> String {
    ">>".to_string()
}

fn default_begin() -> String {
    "begin".to_string()
}

fn default_end() -> String {
    "end".to_string()
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            open: default_open(),
            close: default_close(),
            begin: default_begin(),
            end: default_end(),
        }
    }
}

impl Markers {
    pub fn new(open: &str, close: &str, begin: &str, end: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
            begin: begin.to_string(),
            end: end.to_string(),
        }
    }

    /// Characters that may not appear inside a reference label, derived
    /// from the brackets plus the `#` separating document and name.
    pub fn forbidden_label_chars(&self) -> String {
        let mut chars: Vec<char> = self.open.chars().chain(self.close.chars()).collect();
        chars.push('#');
        chars.sort_unstable();
        chars.dedup();
        chars.into_iter().collect()
    }
}
