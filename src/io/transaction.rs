//! Batched file changes with conflict checks.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::filedb::FileDB;
use super::stat::hexdigest_file;
use crate::errors::{EntangledError, Result};

/// How a transaction is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// Refuse to run when any action conflicts.
    #[default]
    Execute,
    /// Run regardless of conflicts.
    Force,
    /// Only report what would happen.
    Show,
    /// Touch no files; record the outcome in the database as if run.
    ResetDb,
}

/// One file change. Paths are relative to the transaction root.
pub trait Action: std::fmt::Debug + Send + Sync {
    fn target(&self) -> &Path;

    /// Describes why running this action would lose data, if it would.
    fn conflict(&self, root: &Path, db: &FileDB) -> Result<Option<String>>;

    fn execute(&self, root: &Path) -> Result<()>;

    fn update_db(&self, db: &mut FileDB);

    fn describe(&self) -> String;
}

/// Create a file that is not there yet.
#[derive(Debug)]
pub struct Create {
    pub path: PathBuf,
    pub content: String,
}

impl Action for Create {
    fn target(&self) -> &Path {
        &self.path
    }

    fn conflict(&self, root: &Path, _db: &FileDB) -> Result<Option<String>> {
        let full = root.join(&self.path);
        if full.exists() && fs::read_to_string(&full)? != self.content {
            return Ok(Some(format!(
                "{} exists and is not managed by entangled",
                self.path.display()
            )));
        }
        Ok(None)
    }

    fn execute(&self, root: &Path) -> Result<()> {
        atomic_write(&root.join(&self.path), &self.content)?;
        Ok(())
    }

    fn update_db(&self, db: &mut FileDB) {
        db.record(self.path.clone(), &self.content);
    }

    fn describe(&self) -> String {
        format!("create {}", self.path.display())
    }
}

/// Overwrite a file the database knows about.
#[derive(Debug)]
pub struct Replace {
    pub path: PathBuf,
    pub content: String,
}

impl Action for Replace {
    fn target(&self) -> &Path {
        &self.path
    }

    fn conflict(&self, root: &Path, db: &FileDB) -> Result<Option<String>> {
        if db.is_modified(root, &self.path)? {
            return Ok(Some(format!(
                "{} was modified since it was last written",
                self.path.display()
            )));
        }
        Ok(None)
    }

    fn execute(&self, root: &Path) -> Result<()> {
        let full = root.join(&self.path);
        if full.exists() && fs::read_to_string(&full)? == self.content {
            tracing::debug!("{} is unchanged", self.path.display());
            return Ok(());
        }
        atomic_write(&full, &self.content)?;
        Ok(())
    }

    fn update_db(&self, db: &mut FileDB) {
        db.record(self.path.clone(), &self.content);
    }

    fn describe(&self) -> String {
        format!("write {}", self.path.display())
    }
}

/// Remove a file the database knows about.
#[derive(Debug)]
pub struct Delete {
    pub path: PathBuf,
}

impl Action for Delete {
    fn target(&self) -> &Path {
        &self.path
    }

    fn conflict(&self, root: &Path, db: &FileDB) -> Result<Option<String>> {
        if db.is_modified(root, &self.path)? {
            return Ok(Some(format!(
                "{} was modified since it was last written; not deleting",
                self.path.display()
            )));
        }
        Ok(None)
    }

    fn execute(&self, root: &Path) -> Result<()> {
        let full = root.join(&self.path);
        if full.exists() {
            fs::remove_file(&full)?;
        }
        Ok(())
    }

    fn update_db(&self, db: &mut FileDB) {
        db.forget(&self.path);
    }

    fn describe(&self) -> String {
        format!("delete {}", self.path.display())
    }
}

/// Rewrite a file whose new content was derived from what is on disk now.
///
/// Conflicts only when the file changed after it was read.
#[derive(Debug)]
pub struct Update {
    pub path: PathBuf,
    pub content: String,
    /// Digest of the content the update was derived from.
    pub based_on: String,
}

impl Action for Update {
    fn target(&self) -> &Path {
        &self.path
    }

    fn conflict(&self, root: &Path, _db: &FileDB) -> Result<Option<String>> {
        let full = root.join(&self.path);
        if full.exists() && hexdigest_file(&full)? != self.based_on {
            return Ok(Some(format!(
                "{} changed while it was being processed",
                self.path.display()
            )));
        }
        Ok(None)
    }

    fn execute(&self, root: &Path) -> Result<()> {
        atomic_write(&root.join(&self.path), &self.content)?;
        Ok(())
    }

    fn update_db(&self, db: &mut FileDB) {
        db.record(self.path.clone(), &self.content);
    }

    fn describe(&self) -> String {
        format!("update {}", self.path.display())
    }
}

/// Accept the current content of a file as known, without writing it.
#[derive(Debug)]
pub struct Track {
    pub path: PathBuf,
    pub content: String,
}

impl Action for Track {
    fn target(&self) -> &Path {
        &self.path
    }

    fn conflict(&self, _root: &Path, _db: &FileDB) -> Result<Option<String>> {
        Ok(None)
    }

    fn execute(&self, _root: &Path) -> Result<()> {
        Ok(())
    }

    fn update_db(&self, db: &mut FileDB) {
        db.record(self.path.clone(), &self.content);
    }

    fn describe(&self) -> String {
        format!("track {}", self.path.display())
    }
}

/// A list of actions run all together or not at all.
#[derive(Debug)]
pub struct Transaction {
    root: PathBuf,
    actions: Vec<Box<dyn Action>>,
}

impl Transaction {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            actions: Vec::new(),
        }
    }

    pub fn add(&mut self, action: impl Action + 'static) {
        self.actions.push(Box::new(action));
    }

    /// Writes `content` to `path`, as a replace when the database tracks the
    /// file and as a create otherwise.
    pub fn write(&mut self, db: &FileDB, path: impl Into<PathBuf>, content: impl Into<String>) {
        let path = path.into();
        let content = content.into();
        if db.is_tracked(&path) {
            self.add(Replace { path, content });
        } else {
            self.add(Create { path, content });
        }
    }

    pub fn delete(&mut self, path: impl Into<PathBuf>) {
        self.add(Delete { path: path.into() });
    }

    /// Rewrites `path` with content derived from the version hashing to `based_on`.
    pub fn update(
        &mut self,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        based_on: String,
    ) {
        self.add(Update {
            path: path.into(),
            content: content.into(),
            based_on,
        });
    }

    pub fn track(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.add(Track {
            path: path.into(),
            content: content.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn describe(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.describe()).collect()
    }

    /// Every conflict, paired with the affected path.
    pub fn conflicts(&self, db: &FileDB) -> Result<Vec<(PathBuf, String)>> {
        let mut conflicts = Vec::new();
        for action in &self.actions {
            if let Some(reason) = action.conflict(&self.root, db)? {
                conflicts.push((action.target().to_path_buf(), reason));
            }
        }
        Ok(conflicts)
    }

    /// Runs the transaction in the given mode.
    pub fn run(&self, db: &mut FileDB, mode: TransactionMode) -> Result<()> {
        match mode {
            TransactionMode::Show => {
                for description in self.describe() {
                    tracing::info!("[dry run] {}", description);
                }
                for (_, reason) in self.conflicts(db)? {
                    tracing::warn!("[dry run] conflict: {}", reason);
                }
                Ok(())
            }
            TransactionMode::ResetDb => {
                for action in &self.actions {
                    action.update_db(db);
                }
                tracing::info!("recorded {} files without writing", self.actions.len());
                Ok(())
            }
            TransactionMode::Execute => {
                let conflicts = self.conflicts(db)?;
                if let Some((path, _)) = conflicts.first() {
                    for (_, reason) in &conflicts {
                        tracing::warn!("conflict: {}", reason);
                    }
                    return Err(EntangledError::FileConflict { path: path.clone() });
                }
                self.apply(db)
            }
            TransactionMode::Force => self.apply(db),
        }
    }

    fn apply(&self, db: &mut FileDB) -> Result<()> {
        for action in &self.actions {
            tracing::info!("{}", action.describe());
            action.execute(&self.root)?;
            action.update_db(db);
        }
        Ok(())
    }
}

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Writes through a temporary file in the same directory, then renames.
fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let temp_path = parent.join(format!(
        ".entangled-tmp-{}-{}",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)
}
