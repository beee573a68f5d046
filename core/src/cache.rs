//! Compile-once grammar cache.
//!
//! Usage strings are usually literals fixed for the life of the program, so
//! each distinct string is compiled at most once and the resulting
//! definition is shared. Concurrent first requests for the same string wait
//! on a single compilation instead of racing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::compile::Compiler;
use crate::error::ParseError;
use crate::hash::{FlagHasher, PolyHash};
use crate::types::ParserDef;

type Slot<H> = Arc<OnceLock<Result<Arc<ParserDef<H>>, ParseError>>>;

/// Thread-safe map from usage string to its compiled definition.
///
/// Failed compilations are cached too: asking again returns the same error
/// without recompiling.
#[derive(Debug)]
pub struct GrammarCache<H = PolyHash> {
    compiler: Compiler<H>,
    slots: Mutex<HashMap<String, Slot<H>>>,
    compilations: AtomicUsize,
}

impl GrammarCache<PolyHash> {
    pub fn new() -> Self {
        Self::with_compiler(Compiler::new())
    }
}

impl Default for GrammarCache<PolyHash> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: FlagHasher + Clone> GrammarCache<H> {
    pub fn with_compiler(compiler: Compiler<H>) -> Self {
        Self {
            compiler,
            slots: Mutex::new(HashMap::new()),
            compilations: AtomicUsize::new(0),
        }
    }

    /// Returns the definition for `usage`, compiling it on first request.
    pub fn get_or_compile(&self, usage: &str) -> Result<Arc<ParserDef<H>>, ParseError> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(usage.to_string()).or_default())
        };
        // compile outside the map lock so distinct grammars don't serialize
        slot.get_or_init(|| {
            self.compilations.fetch_add(1, Ordering::Relaxed);
            debug!(usage, "Compiling uncached usage grammar");
            self.compiler.compile(usage).map(Arc::new)
        })
        .clone()
    }

    /// Number of compilations actually performed.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Number of distinct usage strings seen.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static GLOBAL: LazyLock<GrammarCache> = LazyLock::new(GrammarCache::new);

/// Compiles `usage` with default settings through a process-wide cache.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use argspec_core::compile_cached;
///
/// let a = compile_cached("<src> <dst>").unwrap();
/// let b = compile_cached("<src> <dst>").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub fn compile_cached(usage: &str) -> Result<Arc<ParserDef>, ParseError> {
    GLOBAL.get_or_compile(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_compiles_each_usage_once() {
        let cache = GrammarCache::new();
        let a = cache.get_or_compile("<a> [-v]").unwrap();
        let b = cache.get_or_compile("<a> [-v]").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        cache.get_or_compile("<b>").unwrap();
        assert_eq!(cache.compilations(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failures_are_cached() {
        let cache = GrammarCache::new();
        let first = cache.get_or_compile("[<a").unwrap_err();
        let second = cache.get_or_compile("[<a").unwrap_err();
        assert_eq!(first, second);
        assert_eq!(first.kind, ErrorKind::OpenSpecialCharacter);
        assert_eq!(cache.compilations(), 1);
    }

    #[test]
    fn test_concurrent_requests_share_one_compilation() {
        let cache = GrammarCache::new();
        let defs: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get_or_compile("[-l] [--color=<m>] <dirs...>")))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });
        assert_eq!(cache.compilations(), 1);
        assert!(defs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
