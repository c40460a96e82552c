//! High-level interface for Entangled operations.

mod context;
mod drivers;

pub use context::Context;
pub use drivers::{
    reset_filedb, stitch_documents, sync_documents, tangle_documents, target_status, TargetStatus,
};
