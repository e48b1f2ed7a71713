//! Content-addressed hashing over canonical form

use crate::canonical::pack;
use crate::sexp::Sexp;
use sha2::{Digest, Sha256};

/// Content hash of an S-expression: SHA-256 over the canonical packing,
/// so structurally equal trees hash identically whatever their textual
/// spelling was.
pub struct ContentHash;

impl ContentHash {
    /// Hex-encoded SHA-256 of the canonical serialization.
    pub fn hash(e: &Sexp) -> String {
        Self::hash_bytes(&pack(e))
    }

    /// Short hash (first 8 characters).
    pub fn short_hash(e: &Sexp) -> String {
        let full = Self::hash(e);
        full[..8].to_string()
    }

    /// Hash arbitrary bytes.
    pub fn hash_bytes(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    pub fn short_hash_bytes(data: &[u8]) -> String {
        let full = Self::hash_bytes(data);
        full[..8].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse;

    #[test]
    fn test_hash_consistency() {
        let e = Sexp::form(
            "cert",
            vec![Sexp::text_str("alice"), Sexp::binary(vec![1, 2, 3])],
        );
        assert_eq!(ContentHash::hash(&e), ContentHash::hash(&e));
        assert_eq!(ContentHash::short_hash(&e).len(), 8);
    }

    #[test]
    fn test_different_trees_different_hashes() {
        let a = Sexp::text_str("a");
        let b = Sexp::text_str("b");
        assert_ne!(ContentHash::hash(&a), ContentHash::hash(&b));
    }

    #[test]
    fn test_spelling_does_not_affect_hash() {
        // same atom via raw, hex and base64 spellings
        let raw = parse("3:abc").unwrap().unwrap();
        let hexed = parse("#616263#").unwrap().unwrap();
        let based = parse("|YWJj|").unwrap().unwrap();
        assert_eq!(ContentHash::hash(&raw), ContentHash::hash(&hexed));
        assert_eq!(ContentHash::hash(&raw), ContentHash::hash(&based));
    }
}
