//! Interned string table
//!
//! Event rows repeat a small vocabulary of API names, op types and kernel
//! descriptions. Chunks store `u32` indices into a per-trace table instead
//! of owned strings.

use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Append-only interned string table
///
/// Entries are never removed: chunks of a trace share indices into one
/// table, and eviction of a chunk does not know which strings it alone used.
#[derive(Debug, Default)]
pub struct StringTable {
    /// String → index, FxHash for fast non-crypto lookups
    index: FxHashMap<Arc<str>, u32>,
    /// Index → string
    strings: Vec<Arc<str>>,
    /// Bytes of string payload held by the table
    bytes: usize,
}

impl StringTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its index
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        let shared: Arc<str> = Arc::from(s);
        self.bytes += s.len();
        self.strings.push(Arc::clone(&shared));
        self.index.insert(shared, idx);
        idx
    }

    /// Look up a string by index
    pub fn get(&self, idx: u32) -> Option<Arc<str>> {
        self.strings.get(idx as usize).cloned()
    }

    /// Number of distinct strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// True when no string has been interned
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Approximate bytes held: payload plus one pointer pair per entry
    pub fn memory_footprint(&self) -> usize {
        self.bytes + self.strings.len() * 2 * std::mem::size_of::<Arc<str>>()
    }
}
