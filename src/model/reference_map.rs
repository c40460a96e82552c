//! Fragment registry indexed by name.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use super::fragment::Fragment;
use super::reference_id::ReferenceId;
use super::reference_name::ReferenceName;
use crate::errors::{EntangledError, Result};

/// Every fragment discovered in the document tree.
///
/// - Primary index: `IndexMap<ReferenceId, Arc<Fragment>>` (registration order)
/// - Name index: `IndexMap<ReferenceName, Vec<ReferenceId>>` (first-seen name
///   order, per-name append order)
/// - Targets: `IndexMap<PathBuf, ReferenceName>` (output file registry)
///
/// Fragments sit behind `Arc` so that cloning a map for a tangle snapshot is
/// cheap; updates go through `Arc::make_mut`.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    fragments: IndexMap<ReferenceId, Arc<Fragment>>,
    name_index: IndexMap<ReferenceName, Vec<ReferenceId>>,
    targets: IndexMap<PathBuf, ReferenceName>,
}

impl ReferenceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment to its name's sequence and assigns its id.
    ///
    /// Names are not unique: declaring the same name again extends the
    /// definition.
    pub fn register(&mut self, mut fragment: Fragment) -> ReferenceId {
        let name = fragment.key().clone();
        let ids = self.name_index.entry(name.clone()).or_default();
        let id = ReferenceId::new(name.clone(), ids.len());
        ids.push(id.clone());
        fragment.id = id.clone();

        if let Some(target) = &fragment.target {
            match self.targets.get(target) {
                Some(existing) if *existing != name => {
                    tracing::warn!(
                        "{} is already produced by <<{}>>, ignoring declaration in <<{}>>",
                        target.display(),
                        existing,
                        name
                    );
                }
                Some(_) => {}
                None => {
                    self.targets.insert(target.clone(), name.clone());
                }
            }
        }

        tracing::trace!("registered fragment {}", id);
        self.fragments.insert(id.clone(), Arc::new(fragment));
        id
    }

    /// All fragments registered under `name`, in registration order.
    pub fn resolve(&self, name: &ReferenceName) -> Result<Vec<&Fragment>> {
        let ids = self
            .name_index
            .get(name)
            .ok_or_else(|| EntangledError::UndefinedReference {
                name: name.clone(),
                location: None,
            })?;
        Ok(ids
            .iter()
            .filter_map(|id| self.fragments.get(id))
            .map(|arc| arc.as_ref())
            .collect())
    }

    /// Every registered name, including generated anonymous names.
    pub fn all_names(&self) -> BTreeSet<ReferenceName> {
        self.name_index.keys().cloned().collect()
    }

    pub fn get(&self, id: &ReferenceId) -> Option<&Fragment> {
        self.fragments.get(id).map(|arc| arc.as_ref())
    }

    /// Replaces the content of a fragment. Returns false if the id is unknown.
    pub fn update_lines(&mut self, id: &ReferenceId, lines: Vec<String>) -> bool {
        match self.fragments.get_mut(id) {
            Some(arc) => {
                Arc::make_mut(arc).lines = lines;
                true
            }
            None => false,
        }
    }

    /// Gets the reference name for a target file.
    pub fn get_target_name(&self, path: &Path) -> Option<&ReferenceName> {
        self.targets.get(path)
    }

    pub fn contains_name(&self, name: &ReferenceName) -> bool {
        self.name_index.contains_key(name)
    }

    pub fn contains_id(&self, id: &ReferenceId) -> bool {
        self.fragments.contains_key(id)
    }

    /// Output files in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = &PathBuf> {
        self.targets.keys()
    }

    /// Names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &ReferenceName> {
        self.name_index.keys()
    }

    /// Fragments in registration order.
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.values().map(|arc| arc.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ReferenceId, &Fragment)> {
        self.fragments.iter().map(|(id, arc)| (id, arc.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn count_by_name(&self, name: &ReferenceName) -> usize {
        self.name_index.get(name).map(Vec::len).unwrap_or(0)
    }

    /// Number of fragments originating from each document.
    pub fn counts_by_document(&self) -> HashMap<PathBuf, usize> {
        let mut counts = HashMap::new();
        for fragment in self.fragments() {
            if let Some(origin) = fragment.origin() {
                *counts.entry(origin.to_path_buf()).or_insert(0) += 1;
            }
        }
        counts
    }
}
