//! Pluggable hashing strategies for flag spellings.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

/// Maps a flag spelling to a 64-bit hash code.
///
/// Implementations must be deterministic: the same spelling always yields
/// the same code for the lifetime of a compiled grammar. Codes need not be
/// unique; the [`FlagTable`](crate::FlagTable) re-checks the literal spelling
/// on every hit.
pub trait FlagHasher {
    fn hash(&self, spelling: &str) -> u64;
}

const POLY_BASE: u64 = 13;

/// Polynomial hash over Unicode scalar values (base 13).
///
/// Cheap and adequate for the handful of aliases a typical grammar declares.
///
/// # Examples
///
/// ```
/// use argspec_core::{FlagHasher, PolyHash};
///
/// assert_eq!(PolyHash.hash(""), 0);
/// assert_eq!(PolyHash.hash("-a"), 45 + 97 * 13);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolyHash;

impl FlagHasher for PolyHash {
    fn hash(&self, spelling: &str) -> u64 {
        let mut out: u64 = 0;
        let mut term: u64 = 1;
        for c in spelling.chars() {
            out = out.wrapping_add(u64::from(c).wrapping_mul(term));
            term = term.wrapping_mul(POLY_BASE);
        }
        out
    }
}

/// The standard library's [`DefaultHasher`] with its fixed keys.
///
/// Better distribution for large alias sets. The algorithm is unspecified,
/// so codes are stable within one build only; never persist them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StdHash;

impl FlagHasher for StdHash {
    fn hash(&self, spelling: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        hasher.write(spelling.as_bytes());
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poly_hash_is_order_sensitive() {
        assert_ne!(PolyHash.hash("-ab"), PolyHash.hash("-ba"));
        assert_eq!(PolyHash.hash("--color"), PolyHash.hash("--color"));
    }

    #[test]
    fn test_std_hash_is_deterministic() {
        assert_eq!(StdHash.hash("--verbose"), StdHash.hash("--verbose"));
        assert_ne!(StdHash.hash("--verbose"), StdHash.hash("--verbosf"));
    }
}
