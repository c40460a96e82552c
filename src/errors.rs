//! Error types for the Entangled system.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ReferenceName;
use crate::text_location::TextLocation;

/// Main error type for Entangled operations.
#[derive(Error, Debug)]
pub enum EntangledError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Parse error at {location}: {message}")]
    Parse { location: TextLocation, message: String },

    /// A `<<name>>` reference to a fragment that was never registered.
    #[error("Undefined reference <<{name}>>{}", referenced_from(.location))]
    UndefinedReference {
        name: ReferenceName,
        location: Option<TextLocation>,
    },

    /// The reference graph contains a cycle; the path ends with the re-entered name.
    #[error("Cyclic reference: {}", cycle_path(.0))]
    CyclicReference(Vec<ReferenceName>),

    #[error("Malformed annotation at {location}: {message}")]
    MalformedAnnotation { location: TextLocation, message: String },

    #[error("Invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("File conflict: {path} has been modified externally")]
    FileConflict { path: PathBuf },

    #[error("Invalid property: {0}")]
    InvalidProperty(String),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("{0}")]
    Other(String),
}

fn referenced_from(location: &Option<TextLocation>) -> String {
    match location {
        Some(loc) => format!(" (referenced from {})", loc),
        None => String::new(),
    }
}

fn cycle_path(names: &[ReferenceName]) -> String {
    names
        .iter()
        .map(|n| n.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl EntangledError {
    /// Returns true for errors caused by the document or annotated file content,
    /// as opposed to the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            EntangledError::UndefinedReference { .. }
                | EntangledError::CyclicReference(_)
                | EntangledError::MalformedAnnotation { .. }
                | EntangledError::Parse { .. }
                | EntangledError::InvalidProperty(_)
        )
    }
}

/// Result type alias for Entangled operations.
pub type Result<T> = std::result::Result<T, EntangledError>;
