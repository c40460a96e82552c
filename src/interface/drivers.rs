//! Project-level tangle, stitch, sync and status.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::DocumentModel;
use crate::errors::Result;
use crate::io::{hexdigest_str, Transaction, TransactionMode};

use super::context::Context;

/// Writes every target of `model`, deletes targets no document produces
/// any more and records what was written. Returns the number of files
/// written or deleted.
pub fn tangle_documents(
    ctx: &mut Context,
    model: &DocumentModel,
    mode: TransactionMode,
) -> Result<usize> {
    let mut transaction = Transaction::new(&ctx.base_dir);
    let mut dependencies = BTreeMap::new();
    let mut changes = 0;

    let targets = model.targets();
    for target in &targets {
        let (text, deps) = model.expand_to_text(target, &ctx.config)?;
        dependencies.insert(target.clone(), deps);

        let recorded = ctx.filedb.get(target).is_some_and(|r| r.matches(&text));
        let on_disk = fs::read_to_string(ctx.resolve_path(target)).ok();
        if recorded && on_disk.as_deref() == Some(text.as_str()) {
            tracing::debug!("{} is up to date", target.display());
            continue;
        }
        transaction.write(&ctx.filedb, target.clone(), text);
        changes += 1;
    }

    let orphans: Vec<PathBuf> = ctx
        .filedb
        .targets()
        .filter(|t| !targets.contains(t))
        .cloned()
        .collect();
    for orphan in orphans {
        tracing::debug!("{} is no longer produced", orphan.display());
        transaction.delete(orphan);
        changes += 1;
    }

    for document in model.documents() {
        transaction.track(document.path(), model.render(document.path())?);
    }

    transaction.run(&mut ctx.filedb, mode)?;

    if mode != TransactionMode::Show {
        for (target, deps) in dependencies {
            ctx.filedb.add_target(target.clone());
            ctx.filedb.set_dependencies(target, deps);
        }
    }
    Ok(changes)
}

/// Reads back every target edited since it was last written, applies the
/// edits to `model` and rewrites the affected documents. Returns the
/// documents that changed.
pub fn stitch_documents(
    ctx: &mut Context,
    model: &mut DocumentModel,
    mode: TransactionMode,
) -> Result<BTreeSet<PathBuf>> {
    if ctx.config.annotation.is_one_way() {
        tracing::info!(
            "annotation method `{:?}` leaves no markers, nothing to stitch",
            ctx.config.annotation
        );
        return Ok(BTreeSet::new());
    }

    let mut digests = HashMap::new();
    for document in model.documents() {
        let text = model.render(document.path())?;
        digests.insert(document.path().to_path_buf(), hexdigest_str(&text));
    }

    let mut transaction = Transaction::new(&ctx.base_dir);
    let mut changed = BTreeSet::new();

    for target in model.targets() {
        let full = ctx.resolve_path(&target);
        if !full.exists() {
            continue;
        }
        if ctx.filedb.is_tracked(&target) && !ctx.filedb.is_modified(&ctx.base_dir, &target)? {
            tracing::debug!("{} is unchanged since the last tangle", target.display());
            continue;
        }

        let text = fs::read_to_string(&full)?;
        let updated = model.stitch_text(&target, &text, &ctx.config)?;
        tracing::debug!("stitched {}: {} documents affected", target.display(), updated.len());
        changed.extend(updated);
        transaction.track(target, text);
    }

    for document in &changed {
        if ctx.filedb.is_modified(&ctx.base_dir, document)? {
            tracing::warn!(
                "{} was edited since the last tangle as well; \
                 where both touched a block the code wins",
                document.display()
            );
        }
        let based_on = digests.get(document).cloned().unwrap_or_default();
        transaction.update(document.clone(), model.render(document)?, based_on);
    }

    transaction.run(&mut ctx.filedb, mode)?;
    Ok(changed)
}

/// Stitch, then tangle.
pub fn sync_documents(ctx: &mut Context, mode: TransactionMode) -> Result<()> {
    let mut model = ctx.load_model()?;
    let stitched = stitch_documents(ctx, &mut model, mode)?;
    let tangled = tangle_documents(ctx, &model, mode)?;
    tracing::debug!("sync: {} documents stitched, {} files tangled", stitched.len(), tangled);
    Ok(())
}

/// Rebuilds the file database from a tangle pass that writes nothing.
pub fn reset_filedb(ctx: &mut Context) -> Result<()> {
    ctx.filedb.clear();
    let model = ctx.load_model()?;
    tangle_documents(ctx, &model, TransactionMode::ResetDb)?;
    Ok(())
}

/// State of a target relative to the file database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    UpToDate,
    /// A document it depends on changed, or no document produces it any more.
    Stale,
    /// Edited outside entangled, or never written by it.
    Modified,
    Missing,
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TargetStatus::UpToDate => "up to date",
            TargetStatus::Stale => "stale",
            TargetStatus::Modified => "modified",
            TargetStatus::Missing => "missing",
        };
        f.write_str(text)
    }
}

/// Status of every target that `model` produces or the database remembers.
pub fn target_status(
    ctx: &Context,
    model: &DocumentModel,
) -> Result<Vec<(PathBuf, TargetStatus)>> {
    let produced: BTreeSet<PathBuf> = model.targets().into_iter().collect();
    let all: BTreeSet<PathBuf> = produced
        .iter()
        .chain(ctx.filedb.targets())
        .cloned()
        .collect();

    let mut result = Vec::with_capacity(all.len());
    for target in all {
        let status = status_of(ctx, &target, produced.contains(&target))?;
        result.push((target, status));
    }
    Ok(result)
}

fn status_of(ctx: &Context, target: &Path, produced: bool) -> Result<TargetStatus> {
    if !ctx.resolve_path(target).exists() {
        return Ok(TargetStatus::Missing);
    }
    if !ctx.filedb.is_tracked(target) || ctx.filedb.is_modified(&ctx.base_dir, target)? {
        return Ok(TargetStatus::Modified);
    }
    if !produced {
        return Ok(TargetStatus::Stale);
    }
    if let Some(deps) = ctx.filedb.dependencies(target) {
        for document in deps {
            let tracked = ctx.filedb.is_tracked(document);
            if !tracked || ctx.filedb.is_modified(&ctx.base_dir, document)? {
                return Ok(TargetStatus::Stale);
            }
        }
    }
    Ok(TargetStatus::UpToDate)
}
