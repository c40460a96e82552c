//! Cache of compiled regular expressions keyed by pattern text.
//!
//! Patterns built from runtime text (comment delimiters, marker words) are
//! compiled once per distinct pattern string. The cache only grows; its size
//! is bounded by the number of distinct pattern texts the program constructs,
//! not by input volume.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{EntangledError, Result};

static GLOBAL: Lazy<PatternCache> = Lazy::new(PatternCache::new);

/// Append-only map from pattern text to compiled regex.
///
/// Most callers use the process-wide instance through [`compile_cached`]. A
/// long-running host can keep its own `PatternCache` per session instead.
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: RwLock<HashMap<String, Arc<Regex>>>,
    compilations: AtomicUsize,
}

impl PatternCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static PatternCache {
        &GLOBAL
    }

    /// Returns the compiled regex for `pattern`, compiling it on first use.
    ///
    /// Identical pattern text always yields the same `Arc<Regex>`. A pattern
    /// that fails to compile is reported as [`EntangledError::Pattern`] and is
    /// not cached.
    pub fn compile(&self, pattern: &str) -> Result<Arc<Regex>> {
        {
            let patterns = self
                .patterns
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(regex) = patterns.get(pattern) {
                return Ok(Arc::clone(regex));
            }
        }

        let mut patterns = self
            .patterns
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another thread may have inserted between dropping the read lock and here.
        if let Some(regex) = patterns.get(pattern) {
            return Ok(Arc::clone(regex));
        }

        self.compilations.fetch_add(1, Ordering::Relaxed);
        let regex = Regex::new(pattern).map_err(|source| EntangledError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        tracing::trace!("compiled pattern {:?}", pattern);

        let regex = Arc::new(regex);
        patterns.insert(pattern.to_string(), Arc::clone(&regex));
        Ok(regex)
    }

    /// Number of times the regex compiler has been invoked (cache misses).
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Number of distinct patterns currently cached.
    pub fn len(&self) -> usize {
        self.patterns
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compiles `pattern` through the process-wide [`PatternCache`].
pub fn compile_cached(pattern: &str) -> Result<Arc<Regex>> {
    PatternCache::global().compile(pattern)
}
