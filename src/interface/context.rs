//! Execution context for Entangled operations.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::document::DocumentModel;
use crate::errors::{EntangledError, Result};
use crate::io::FileDB;

/// Configuration, file database and project root shared by the drivers.
pub struct Context {
    pub config: Config,
    /// File database for tracking tangled files.
    pub filedb: FileDB,
    /// Project root; every path the drivers handle is relative to it.
    pub base_dir: PathBuf,
    pub filedb_path: PathBuf,
}

impl Context {
    /// Creates a context, loading the file database if there is one.
    pub fn new(config: Config, base_dir: PathBuf) -> Result<Self> {
        let filedb_path = base_dir.join(&config.filedb_path);
        let filedb = FileDB::load(&filedb_path)?;

        Ok(Self {
            config,
            filedb,
            base_dir,
            filedb_path,
        })
    }

    /// Creates a context with default configuration.
    pub fn default_for_dir(base_dir: PathBuf) -> Result<Self> {
        Self::new(Config::default(), base_dir)
    }

    /// Creates a context from the current directory.
    pub fn from_current_dir() -> Result<Self> {
        let base_dir = std::env::current_dir()?;
        let config = crate::config::read_config(&base_dir)?;
        Self::new(config, base_dir)
    }

    pub fn save_filedb(&self) -> Result<()> {
        self.filedb.save(&self.filedb_path)
    }

    /// Source documents matching the configured patterns, relative to the
    /// base directory and sorted.
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        let ignore = self
            .config
            .ignore_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let root = glob::Pattern::escape(&self.base_dir.to_string_lossy());
        let mut files = Vec::new();
        for pattern in &self.config.source_patterns {
            let full = format!("{}/{}", root.trim_end_matches('/'), pattern);
            for entry in glob::glob(&full)? {
                let path = entry.map_err(|e| EntangledError::Io(e.into_error()))?;
                if !path.is_file() {
                    continue;
                }
                let relative = self.relative_path(&path);
                if ignore.iter().any(|p| p.matches_path(&relative)) {
                    tracing::debug!("ignoring {}", relative.display());
                    continue;
                }
                files.push(relative);
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Reads every source document into a fresh model.
    pub fn load_model(&self) -> Result<DocumentModel> {
        let mut model = DocumentModel::new();
        for path in self.source_files()? {
            let text = fs::read_to_string(self.resolve_path(&path))?;
            model.load_markdown(&path, &text, &self.config)?;
        }
        for (name, location) in model.undefined_references() {
            tracing::warn!("{}: reference to undefined <<{}>>", location, name);
        }
        Ok(model)
    }

    /// Resolves a path relative to the base directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// The inverse of [`Context::resolve_path`] for paths under the base directory.
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.base_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
