//! Configuration data structures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::annotation_method::AnnotationMethod;
use super::language::{Comment, Language};
use super::markers::Markers;

/// Main configuration structure, read from `entangled.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Version of the configuration format.
    #[serde(default = "default_version")]
    pub version: String,

    /// Glob patterns for markdown source files.
    #[serde(default = "default_source_patterns")]
    pub source_patterns: Vec<String>,

    /// Glob patterns excluded from `source_patterns`.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// How to annotate tangled output.
    #[serde(default)]
    pub annotation: AnnotationMethod,

    /// Marker vocabulary for annotations.
    #[serde(default)]
    pub markers: Markers,

    /// Language configurations (take precedence over built-ins).
    #[serde(default)]
    pub languages: Vec<Language>,

    /// File database path, relative to the project root.
    #[serde(default = "default_filedb_path")]
    pub filedb_path: PathBuf,

    #[serde(default)]
    pub watch: WatchConfig,
}

fn default_version() -> String {
    "2.0".to_string()
}

fn default_source_patterns() -> Vec<String> {
    vec!["**/*.md".to_string()]
}

fn default_filedb_path() -> PathBuf {
    PathBuf::from(".entangled/filedb.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            source_patterns: default_source_patterns(),
            ignore_patterns: Vec::new(),
            annotation: AnnotationMethod::default(),
            markers: Markers::default(),
            languages: Vec::new(),
            filedb_path: default_filedb_path(),
            watch: WatchConfig::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a language by identifier, checking custom languages first.
    pub fn find_language(&self, identifier: &str) -> Option<&Language> {
        self.languages
            .iter()
            .find(|l| l.matches(identifier))
            .or_else(|| super::templates::find_language(identifier))
    }

    /// Comment style for fragments in `language`; `#` when unknown.
    pub fn comment_for(&self, language: Option<&str>) -> Comment {
        match language.and_then(|l| self.find_language(l)) {
            Some(lang) => lang.comment.clone(),
            None => {
                tracing::debug!(
                    "no comment style for language {:?}, falling back to `#`",
                    language
                );
                Comment::default()
            }
        }
    }
}

/// Watch mode configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
        }
    }
}

fn default_debounce() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "2.0");
        assert_eq!(config.source_patterns, vec!["**/*.md"]);
        assert_eq!(config.annotation, AnnotationMethod::Standard);
        assert_eq!(config.watch.debounce_ms, 100);
    }

    #[test]
    fn test_custom_language_overrides_builtin() {
        let mut config = Config::default();
        config
            .languages
            .push(Language::new("python", Comment::line("##")));

        assert_eq!(config.comment_for(Some("python")), Comment::line("##"));
        // aliases of the builtin are still served by the builtin table
        assert_eq!(config.comment_for(Some("py")), Comment::line("#"));
    }

    #[test]
    fn test_comment_fallback() {
        let config = Config::default();
        assert_eq!(config.comment_for(None), Comment::line("#"));
        assert_eq!(config.comment_for(Some("nonsense")), Comment::line("#"));
        assert_eq!(config.comment_for(Some("rust")), Comment::line("//"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<Config>("no_version_given = \"\"").is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
