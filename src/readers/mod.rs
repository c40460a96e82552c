//! Document readers.

mod markdown;

pub use markdown::read_markdown;
