//! Sync command implementation.

use crate::errors::Result;
use crate::interface::{sync_documents, Context};
use crate::io::TransactionMode;

use super::transaction_mode;

/// Options for the sync command.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Force overwrite even if files have been modified externally.
    pub force: bool,
    pub dry_run: bool,
}

/// Executes the sync command.
pub fn sync(ctx: &mut Context, options: SyncOptions) -> Result<()> {
    tracing::info!("Synchronizing documents...");

    let mode = transaction_mode(options.force, options.dry_run);
    sync_documents(ctx, mode)?;
    if mode != TransactionMode::Show {
        ctx.save_filedb()?;
    }

    println!("Synchronization complete.");
    Ok(())
}
