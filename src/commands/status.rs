//! Status command implementation.

use crate::errors::Result;
use crate::interface::{target_status, Context, TargetStatus};

/// Options for the status command.
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// List source files and every target, not just the summary.
    pub verbose: bool,
}

/// Executes the status command.
pub fn status(ctx: &Context, options: StatusOptions) -> Result<()> {
    let source_files = ctx.source_files()?;
    println!("Source files: {}", source_files.len());
    if options.verbose {
        for file in &source_files {
            println!("  {}", file.display());
        }
    }

    let model = ctx.load_model()?;
    let targets = target_status(ctx, &model)?;
    println!("\nTarget files: {}", targets.len());

    let mut counts = [0usize; 4];
    for (target, status) in &targets {
        let slot = match status {
            TargetStatus::UpToDate => 0,
            TargetStatus::Stale => 1,
            TargetStatus::Modified => 2,
            TargetStatus::Missing => 3,
        };
        counts[slot] += 1;
        if options.verbose || *status != TargetStatus::UpToDate {
            println!("  {} ({})", target.display(), status);
        }
    }

    println!("\nStatus summary:");
    println!("  Up to date: {}", counts[0]);
    println!("  Stale: {}", counts[1]);
    println!("  Modified: {}", counts[2]);
    println!("  Missing: {}", counts[3]);
    println!("\nTracked files in database: {}", ctx.filedb.len());

    Ok(())
}
