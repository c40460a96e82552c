//! Reset command implementation.

use std::fs;

use crate::errors::Result;
use crate::interface::{reset_filedb, Context};

/// Options for the reset command.
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    /// Only remove the database instead of rebuilding it.
    pub clear: bool,
}

/// Executes the reset command.
///
/// Rebuilds the file database as if every target had just been tangled,
/// without writing any target. Useful after switching branches.
pub fn reset(ctx: &mut Context, options: ResetOptions) -> Result<()> {
    if options.clear {
        ctx.filedb.clear();
        if ctx.filedb_path.exists() {
            fs::remove_file(&ctx.filedb_path)?;
        }
        if let Some(parent) = ctx.filedb_path.parent() {
            // only succeeds when empty
            let _ = fs::remove_dir(parent);
        }
        println!("File database removed.");
        return Ok(());
    }

    reset_filedb(ctx)?;
    ctx.save_filedb()?;
    println!("File database rebuilt: {} files tracked.", ctx.filedb.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_reset_rebuilds_db() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("test.md"),
            "```python #main file=output.py\nprint('hello')\n```\n",
        )
        .unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf()).unwrap();
        ctx.filedb.record("stale.py", "left over");

        reset(&mut ctx, ResetOptions::default()).unwrap();

        let reloaded = Context::default_for_dir(dir.path().to_path_buf()).unwrap();
        assert!(reloaded.filedb.is_target(Path::new("output.py")));
        assert!(!reloaded.filedb.is_tracked(Path::new("stale.py")));
        assert!(!dir.path().join("output.py").exists());
    }

    #[test]
    fn test_reset_clear() {
        let dir = tempdir().unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf()).unwrap();
        ctx.filedb.record("test.py", "content");
        ctx.save_filedb().unwrap();

        reset(&mut ctx, ResetOptions { clear: true }).unwrap();

        assert!(!ctx.filedb_path.exists());
        let reloaded = Context::default_for_dir(dir.path().to_path_buf()).unwrap();
        assert!(reloaded.filedb.is_empty());
    }
}
