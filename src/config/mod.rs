//! Configuration loading and management.

mod annotation_method;
mod config_data;
mod language;
mod markers;
mod templates;

use std::fs;
use std::path::{Path, PathBuf};

pub use annotation_method::AnnotationMethod;
pub use config_data::{Config, WatchConfig};
pub use language::{Comment, Language};
pub use markers::{Markers, ANNOTATION_PREFIX};
pub use templates::{builtin_languages, find_language};

use crate::errors::{EntangledError, Result};

/// Dedicated configuration file name.
const CONFIG_FILE: &str = "entangled.toml";

/// Python-style project file; configuration lives under `[tool.entangled]`.
const PYPROJECT_FILE: &str = "pyproject.toml";

/// Finds the configuration file in the given directory or its parents.
///
/// In each directory `entangled.toml` is preferred over `pyproject.toml`.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        for name in [CONFIG_FILE, PYPROJECT_FILE] {
            let candidate = current.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Reads configuration from a TOML file.
///
/// For `pyproject.toml` only the `[tool.entangled]` table is read; a project
/// file without that table yields the default configuration.
pub fn read_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;

    if path.file_name().and_then(|n| n.to_str()) == Some(PYPROJECT_FILE) {
        return read_config_section(&content, "tool.entangled").map(Option::unwrap_or_default);
    }

    let config: Config = toml::from_str(&content)?;
    tracing::debug!("read config from {}", path.display());
    Ok(config)
}

/// Decodes the table at a dotted `section` path, if it exists.
pub fn read_config_section(content: &str, section: &str) -> Result<Option<Config>> {
    let mut value: toml::Value = toml::from_str(content)?;
    for key in section.split('.') {
        value = match value {
            toml::Value::Table(mut table) => match table.remove(key) {
                Some(inner) => inner,
                None => {
                    tracing::debug!("no section [{}] in configuration", section);
                    return Ok(None);
                }
            },
            _ => {
                return Err(EntangledError::Config(format!(
                    "`{}` is not a table",
                    section
                )))
            }
        };
    }
    let config = value.try_into::<Config>().map_err(EntangledError::TomlParse)?;
    Ok(Some(config))
}

/// Reads configuration, searching from the given directory upward.
///
/// If no config file is found, returns the default configuration.
pub fn read_config(start_dir: &Path) -> Result<Config> {
    match find_config_file(start_dir) {
        Some(path) => read_config_file(&path),
        None => Ok(Config::default()),
    }
}
