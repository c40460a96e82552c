//! Matcher combinators over cached regex leaves.
//!
//! A [`Matcher`] consumes a prefix of its input and reports the named groups
//! it captured. Composition is PEG-like: each part takes the first match it
//! finds and there is no backtracking across parts.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::cache::compile_cached;
use crate::errors::Result;

/// A successful match: the consumed prefix and its named captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'t> {
    text: &'t str,
    captures: Vec<(String, &'t str)>,
}

impl<'t> Match<'t> {
    fn empty(input: &'t str) -> Self {
        Self {
            text: &input[..0],
            captures: Vec::new(),
        }
    }

    /// The consumed text.
    pub fn as_str(&self) -> &'t str {
        self.text
    }

    /// Length in bytes of the consumed prefix.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the named capture. When a name was captured more than once
    /// (e.g. under repetition) the last capture wins.
    pub fn get(&self, name: &str) -> Option<&'t str> {
        self.captures
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Extends this match with one that starts where it ends.
    fn extend(mut self, input: &'t str, next: Match<'t>) -> Self {
        let end = self.text.len() + next.text.len();
        self.text = &input[..end];
        self.captures.extend(next.captures);
        self
    }
}

/// Matches a prefix or the whole of a string, returning captured groups.
pub trait Matcher: fmt::Debug + Send + Sync {
    /// Matches at the start of `input`, possibly consuming only part of it.
    fn match_prefix<'t>(&self, input: &'t str) -> Option<Match<'t>>;

    /// Matches the entire `input`.
    fn match_full<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        self.match_prefix(input).filter(|m| m.len() == input.len())
    }
}

impl<M: Matcher + ?Sized> Matcher for Box<M> {
    fn match_prefix<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        (**self).match_prefix(input)
    }

    fn match_full<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        (**self).match_full(input)
    }
}

/// A regex leaf. Both the prefix and the full-match forms go through the
/// pattern cache, so building the same `Pattern` twice never recompiles.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    prefix: Arc<Regex>,
    full: Arc<Regex>,
}

impl Pattern {
    /// Builds a leaf from regex syntax.
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let prefix = compile_cached(&format!("^(?:{})", source))?;
        let full = compile_cached(&format!("^(?:{})$", source))?;
        Ok(Self {
            source,
            prefix,
            full,
        })
    }

    /// Builds a leaf matching `text` literally.
    pub fn literal(text: &str) -> Result<Self> {
        Self::new(regex::escape(text))
    }

    /// The regex source this leaf was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn capture<'t>(regex: &Regex, input: &'t str) -> Option<Match<'t>> {
        let caps = regex.captures(input)?;
        let whole = caps.get(0)?;
        let captures = regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str())))
            .collect();
        Some(Match {
            text: &input[..whole.end()],
            captures,
        })
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl Matcher for Pattern {
    fn match_prefix<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        Self::capture(&self.prefix, input)
    }

    fn match_full<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        Self::capture(&self.full, input)
    }
}

/// `A` followed by `B`.
#[derive(Debug, Clone)]
pub struct Seq<A, B>(pub A, pub B);

impl<A: Matcher, B: Matcher> Matcher for Seq<A, B> {
    fn match_prefix<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        let first = self.0.match_prefix(input)?;
        let second = self.1.match_prefix(&input[first.len()..])?;
        Some(first.extend(input, second))
    }

    fn match_full<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        let first = self.0.match_prefix(input)?;
        let second = self.1.match_full(&input[first.len()..])?;
        Some(first.extend(input, second))
    }
}

/// `A`, or `B` when `A` does not match.
#[derive(Debug, Clone)]
pub struct Alt<A, B>(pub A, pub B);

impl<A: Matcher, B: Matcher> Matcher for Alt<A, B> {
    fn match_prefix<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        self.0
            .match_prefix(input)
            .or_else(|| self.1.match_prefix(input))
    }

    fn match_full<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        self.0.match_full(input).or_else(|| self.1.match_full(input))
    }
}

/// Zero or more repetitions of `A`, greedy. Stops on an empty match.
#[derive(Debug, Clone)]
pub struct Many<A>(pub A);

impl<A: Matcher> Matcher for Many<A> {
    fn match_prefix<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        let mut acc = Match::empty(input);
        while let Some(next) = self.0.match_prefix(&input[acc.len()..]) {
            if next.is_empty() {
                break;
            }
            acc = acc.extend(input, next);
        }
        Some(acc)
    }
}

/// Builder methods for composing matchers.
pub trait MatcherExt: Matcher + Sized {
    fn then<B: Matcher>(self, next: B) -> Seq<Self, B> {
        Seq(self, next)
    }

    fn or<B: Matcher>(self, other: B) -> Alt<Self, B> {
        Alt(self, other)
    }

    fn repeated(self) -> Many<Self> {
        Many(self)
    }

    fn boxed(self) -> Box<dyn Matcher>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<M: Matcher + Sized> MatcherExt for M {}
