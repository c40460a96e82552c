//! Entangled core - literate programming engine
//!
//! Prose documents carry named code fragments that reference each other with
//! `<<name>>` lines. This crate expands those fragments into flat source files
//! (tangling) and recovers fragment edits from annotated source files back into
//! the documents (stitching).
//!
//! # Layers
//!
//! - [`pattern`]: cached regex compilation and small matcher combinators
//! - [`model`]: fragments, the reference map and the tangling engine
//! - [`annotation`]: the begin/end marker grammar and the stitching reader
//! - [`document`]: prose/fragment content per document and the glue between them
//! - [`interface`] and [`commands`]: file-level drivers used by the CLI
//!
//! # Example
//!
//! ```
//! use entangled_core::document::DocumentModel;
//! use entangled_core::config::Config;
//!
//! let config = Config::default();
//! let mut model = DocumentModel::new();
//! model
//!     .load_markdown(
//!         "hello.md",
//!         "```python #main file=hello.py\nprint('hello')\n```\n",
//!         &config,
//!     )
//!     .unwrap();
//! let (text, deps) = model.expand_to_text("hello.py".as_ref(), &config).unwrap();
//! assert!(text.contains("print('hello')"));
//! assert_eq!(deps.len(), 1);
//! ```

pub mod annotation;
pub mod commands;
pub mod config;
pub mod document;
pub mod errors;
pub mod interface;
pub mod io;
pub mod model;
pub mod pattern;
pub mod readers;
pub mod text_location;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use errors::{EntangledError, Result};
pub use interface::Context;
pub use model::{Fragment, ReferenceId, ReferenceMap, ReferenceName};

pub use commands::{
    ResetOptions, StatusOptions, StitchOptions, SyncOptions, TangleOptions, WatchOptions,
};
