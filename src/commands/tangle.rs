//! Tangle command implementation.

use crate::config::AnnotationMethod;
use crate::errors::Result;
use crate::interface::{tangle_documents, Context};
use crate::io::TransactionMode;

use super::transaction_mode;

/// Options for the tangle command.
#[derive(Debug, Clone, Default)]
pub struct TangleOptions {
    /// Force overwrite even if files have been modified externally.
    pub force: bool,
    /// Dry run - show what would be done without doing it.
    pub dry_run: bool,
    /// Overrides the configured annotation method.
    pub annotation: Option<AnnotationMethod>,
}

/// Executes the tangle command.
pub fn tangle(ctx: &mut Context, options: TangleOptions) -> Result<()> {
    if let Some(method) = options.annotation {
        ctx.config.annotation = method;
    }
    tracing::info!("Tangling documents...");

    let model = ctx.load_model()?;
    let mode = transaction_mode(options.force, options.dry_run);
    let changes = tangle_documents(ctx, &model, mode)?;

    if mode == TransactionMode::Show {
        println!("Would change {} files.", changes);
        return Ok(());
    }
    ctx.save_filedb()?;

    if changes == 0 {
        println!("All targets up to date.");
    } else {
        println!("Tangled {} files.", changes);
    }
    Ok(())
}
