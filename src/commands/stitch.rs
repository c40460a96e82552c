//! Stitch command implementation.

use crate::errors::Result;
use crate::interface::{stitch_documents, Context};
use crate::io::TransactionMode;

use super::transaction_mode;

/// Options for the stitch command.
#[derive(Debug, Clone, Default)]
pub struct StitchOptions {
    /// Write documents even if they changed while being stitched.
    pub force: bool,
    /// Dry run - show what would be done without doing it.
    pub dry_run: bool,
}

/// Executes the stitch command.
pub fn stitch(ctx: &mut Context, options: StitchOptions) -> Result<()> {
    tracing::info!("Stitching documents...");

    let mut model = ctx.load_model()?;
    let mode = transaction_mode(options.force, options.dry_run);
    let changed = stitch_documents(ctx, &mut model, mode)?;

    if changed.is_empty() {
        println!("No documents to stitch.");
        return Ok(());
    }
    if mode == TransactionMode::Show {
        println!("Would update {} documents:", changed.len());
        for path in &changed {
            println!("  {}", path.display());
        }
        return Ok(());
    }

    ctx.save_filedb()?;
    println!("Stitched {} documents.", changed.len());
    Ok(())
}
