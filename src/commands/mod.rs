//! CLI command implementations.

mod reset;
mod status;
mod stitch;
mod sync;
mod tangle;
mod watch;

pub use reset::{reset, ResetOptions};
pub use status::{status, StatusOptions};
pub use stitch::{stitch, StitchOptions};
pub use sync::{sync, SyncOptions};
pub use tangle::{tangle, TangleOptions};
pub use watch::{watch, WatchOptions};

use crate::io::TransactionMode;

fn transaction_mode(force: bool, dry_run: bool) -> TransactionMode {
    if dry_run {
        TransactionMode::Show
    } else if force {
        TransactionMode::Force
    } else {
        TransactionMode::Execute
    }
}
