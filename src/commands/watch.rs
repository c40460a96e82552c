//! Watch command implementation.

use std::path::Path;
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::errors::{EntangledError, Result};
use crate::interface::{sync_documents, Context};
use crate::io::TransactionMode;

/// Options for the watch command.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Debounce delay in milliseconds; 0 uses the configured value.
    pub debounce_ms: u64,
}

/// Executes the watch command. Runs until the watcher fails.
pub fn watch(ctx: &mut Context, options: WatchOptions) -> Result<()> {
    let debounce = Duration::from_millis(if options.debounce_ms > 0 {
        options.debounce_ms
    } else {
        ctx.config.watch.debounce_ms
    });

    println!("Watching for changes (debounce: {}ms)...", debounce.as_millis());
    println!("Press Ctrl+C to stop.");

    run_sync(ctx);

    let (tx, rx) = channel::<Event>();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = tx.send(event);
            }
            Err(e) => tracing::warn!("watch error: {}", e),
        },
        Config::default(),
    )
    .map_err(|e| EntangledError::Watch(e.to_string()))?;

    watcher
        .watch(&ctx.base_dir, RecursiveMode::Recursive)
        .map_err(|e| EntangledError::Watch(e.to_string()))?;

    loop {
        let event = rx
            .recv()
            .map_err(|e| EntangledError::Watch(e.to_string()))?;
        if !event.paths.iter().any(|p| is_relevant(ctx, p)) {
            continue;
        }
        tracing::debug!("change in {:?}", event.paths);

        // wait for the burst to settle
        loop {
            match rx.recv_timeout(debounce) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(EntangledError::Watch("watcher stopped".to_string()))
                }
            }
        }

        run_sync(ctx);

        // events caused by our own writes
        while rx.try_recv().is_ok() {}
    }
}

fn run_sync(ctx: &mut Context) {
    let result = sync_documents(ctx, TransactionMode::Execute).and_then(|()| ctx.save_filedb());
    if let Err(e) = result {
        tracing::error!("sync failed: {}", e);
    }
}

/// Whether a change to `path` can affect documents or targets.
fn is_relevant(ctx: &Context, path: &Path) -> bool {
    let relative = ctx.relative_path(path);
    if let Some(db_dir) = ctx.config.filedb_path.parent() {
        if !db_dir.as_os_str().is_empty() && relative.starts_with(db_dir) {
            return false;
        }
    }
    let temporary = relative
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(".entangled-tmp"));
    if temporary {
        return false;
    }

    ctx.filedb.is_target(&relative)
        || ctx
            .config
            .source_patterns
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .any(|p| p.matches_path(&relative))
}
