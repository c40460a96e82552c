//! Pattern matching primitives shared by every parser in the crate.

mod cache;
mod combinators;

pub use cache::{compile_cached, PatternCache};
pub use combinators::{Alt, Many, Match, Matcher, MatcherExt, Pattern, Seq};
