//! Open-addressing lookup table from flag spelling to node index.

use crate::hash::{FlagHasher, PolyHash};

const MIN_BUCKETS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    spelling: String,
    node: usize,
}

/// Maps every declared flag spelling (aliases included) to its node index.
///
/// Linear probing over a power-of-two bucket array that is kept at most half
/// full. Each probe compares the stored spelling, so hash collisions never
/// produce false positives.
///
/// # Examples
///
/// ```
/// use argspec_core::FlagTable;
///
/// let mut table = FlagTable::default();
/// table.insert("-l", 0).unwrap();
/// table.insert("--long", 0).unwrap();
/// assert_eq!(table.lookup("--long"), Some(0));
/// assert_eq!(table.lookup("--lonk"), None);
/// assert_eq!(table.insert("-l", 3), Err(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagTable<H = PolyHash> {
    hasher: H,
    buckets: Vec<Option<usize>>,
    entries: Vec<Entry>,
}

impl Default for FlagTable<PolyHash> {
    fn default() -> Self {
        Self::with_hasher(PolyHash)
    }
}

impl<H: FlagHasher> FlagTable<H> {
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            hasher,
            buckets: vec![None; MIN_BUCKETS],
            entries: Vec::new(),
        }
    }

    /// Registers `spelling` for `node`.
    ///
    /// Returns `Err(owner)` with the node already holding that spelling.
    pub fn insert(&mut self, spelling: &str, node: usize) -> Result<(), usize> {
        if let Some(owner) = self.lookup(spelling) {
            return Err(owner);
        }
        if (self.entries.len() + 1) * 2 > self.buckets.len() {
            self.grow();
        }
        let slot = self.entries.len();
        self.entries.push(Entry {
            spelling: spelling.to_string(),
            node,
        });
        self.place(slot);
        Ok(())
    }

    /// Resolves a spelling to its node index, or `None` if undeclared.
    pub fn lookup(&self, spelling: &str) -> Option<usize> {
        let mask = self.buckets.len() - 1;
        let mut bucket = self.bucket_of(spelling);
        loop {
            let slot = self.buckets[bucket]?;
            let entry = &self.entries[slot];
            if entry.spelling == spelling {
                return Some(entry.node);
            }
            bucket = (bucket + 1) & mask;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spellings with their node indices, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|e| (e.spelling.as_str(), e.node))
    }

    fn bucket_of(&self, spelling: &str) -> usize {
        // bucket count is a power of two
        (self.hasher.hash(spelling) as usize) & (self.buckets.len() - 1)
    }

    fn place(&mut self, slot: usize) {
        let mask = self.buckets.len() - 1;
        let mut bucket = self.bucket_of(&self.entries[slot].spelling);
        while self.buckets[bucket].is_some() {
            bucket = (bucket + 1) & mask;
        }
        self.buckets[bucket] = Some(slot);
    }

    fn grow(&mut self) {
        self.buckets = vec![None; self.buckets.len() * 2];
        for slot in 0..self.entries.len() {
            self.place(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::StdHash;

    /// Sends every spelling to the same bucket.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Constant;

    impl FlagHasher for Constant {
        fn hash(&self, _spelling: &str) -> u64 {
            7
        }
    }

    #[test]
    fn test_collisions_resolve_by_spelling() {
        let mut table = FlagTable::with_hasher(Constant);
        table.insert("-a", 0).unwrap();
        table.insert("-b", 1).unwrap();
        table.insert("-c", 2).unwrap();
        assert_eq!(table.lookup("-a"), Some(0));
        assert_eq!(table.lookup("-b"), Some(1));
        assert_eq!(table.lookup("-c"), Some(2));
        assert_eq!(table.lookup("-d"), None);
    }

    #[test]
    fn test_grows_past_initial_capacity() {
        let mut table = FlagTable::with_hasher(StdHash);
        for i in 0..100 {
            table.insert(&format!("--flag{i}"), i).unwrap();
        }
        assert_eq!(table.len(), 100);
        for i in 0..100 {
            assert_eq!(table.lookup(&format!("--flag{i}")), Some(i));
        }
        assert_eq!(table.lookup("--flag100"), None);
    }

    #[test]
    fn test_prefix_is_part_of_the_key() {
        let mut table = FlagTable::default();
        table.insert("-l", 0).unwrap();
        assert_eq!(table.lookup("--l"), None);
        assert_eq!(table.lookup("l"), None);
        assert_eq!(table.lookup(""), None);
    }

    #[test]
    fn test_iter_preserves_insertion_order() {
        let mut table = FlagTable::default();
        table.insert("--zeta", 1).unwrap();
        table.insert("-a", 0).unwrap();
        let spellings: Vec<_> = table.iter().map(|(s, _)| s).collect();
        assert_eq!(spellings, vec!["--zeta", "-a"]);
    }
}
