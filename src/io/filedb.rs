//! Persistent record of the files entangled manages.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::stat::FileRecord;
use crate::errors::Result;

/// Content hashes of managed files, the set of generated targets and the
/// documents each target was assembled from.
///
/// Paths are relative to the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDB {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    files: BTreeMap<PathBuf, FileRecord>,

    #[serde(default)]
    targets: BTreeSet<PathBuf>,

    #[serde(default)]
    dependencies: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

fn default_version() -> String {
    "2.0".to_string()
}

impl FileDB {
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: default_version(),
            ..Self::default()
        }
    }

    /// Loads the database, or an empty one when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no file database at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Records `content` as the known state of `path`.
    pub fn record(&mut self, path: impl Into<PathBuf>, content: &str) {
        self.files.insert(path.into(), FileRecord::from_content(content));
    }

    /// Records the current on-disk state of `root/path`.
    pub fn record_file(&mut self, root: &Path, path: &Path) -> Result<()> {
        let record = FileRecord::from_path(&root.join(path))?;
        self.files.insert(path.to_path_buf(), record);
        Ok(())
    }

    /// Drops every trace of `path`.
    pub fn forget(&mut self, path: &Path) {
        self.files.remove(path);
        self.targets.remove(path);
        self.dependencies.remove(path);
    }

    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.files.get(path)
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// True when `root/path` exists and differs from its record. Untracked
    /// and missing files are not considered modified.
    pub fn is_modified(&self, root: &Path, path: &Path) -> Result<bool> {
        let Some(record) = self.files.get(path) else {
            return Ok(false);
        };
        let full = root.join(path);
        if !full.exists() {
            return Ok(false);
        }
        Ok(FileRecord::from_path(&full)?.hexdigest != record.hexdigest)
    }

    pub fn add_target(&mut self, path: impl Into<PathBuf>) {
        self.targets.insert(path.into());
    }

    pub fn is_target(&self, path: &Path) -> bool {
        self.targets.contains(path)
    }

    pub fn targets(&self) -> impl Iterator<Item = &PathBuf> {
        self.targets.iter()
    }

    /// Remembers which documents a target was assembled from.
    pub fn set_dependencies(&mut self, target: impl Into<PathBuf>, documents: BTreeSet<PathBuf>) {
        self.dependencies.insert(target.into(), documents);
    }

    pub fn dependencies(&self, target: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.dependencies.get(target)
    }

    pub fn tracked_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.targets.clear();
        self.dependencies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_record_and_forget() {
        let mut db = FileDB::new();
        db.record("out.py", "print('hello')\n");
        db.add_target("out.py");
        db.set_dependencies("out.py", BTreeSet::from([PathBuf::from("a.md")]));

        assert!(db.is_tracked(Path::new("out.py")));
        assert!(db.is_target(Path::new("out.py")));
        assert!(db.get(Path::new("out.py")).unwrap().matches("print('hello')\n"));

        db.forget(Path::new("out.py"));
        assert!(!db.is_tracked(Path::new("out.py")));
        assert!(!db.is_target(Path::new("out.py")));
        assert!(db.dependencies(Path::new("out.py")).is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join(".entangled/filedb.json");

        let mut db = FileDB::new();
        db.record("a.py", "a");
        db.record("b.md", "b");
        db.add_target("a.py");
        db.set_dependencies("a.py", BTreeSet::from([PathBuf::from("b.md")]));
        db.save(&db_path).unwrap();

        let loaded = FileDB::load(&db_path).unwrap();
        assert_eq!(loaded, db);
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempdir().unwrap();
        let db = FileDB::load(&dir.path().join("none.json")).unwrap();
        assert!(db.is_empty());
        assert_eq!(db.version, "2.0");
    }

    #[test]
    fn test_is_modified() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("out.py"), "original").unwrap();

        let mut db = FileDB::new();
        assert!(!db.is_modified(dir.path(), Path::new("out.py")).unwrap());

        db.record_file(dir.path(), Path::new("out.py")).unwrap();
        assert!(!db.is_modified(dir.path(), Path::new("out.py")).unwrap());

        fs::write(dir.path().join("out.py"), "edited").unwrap();
        assert!(db.is_modified(dir.path(), Path::new("out.py")).unwrap());

        fs::remove_file(dir.path().join("out.py")).unwrap();
        assert!(!db.is_modified(dir.path(), Path::new("out.py")).unwrap());
    }
}
