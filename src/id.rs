//! Hashed identifiers.
//!
//! Element ids and group ids are authored as strings and stored as a 32-bit
//! FNV-1 hash. Collisions are possible and accepted.

use std::fmt;

/// A 32-bit hash of an authoring-time string. `HashId::NONE` (0) means "no id".
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashId(pub u32);

impl HashId {
    /// The empty id.
    pub const NONE: HashId = HashId(0);

    /// Hash `s` with 32-bit FNV-1. The empty string hashes to [`HashId::NONE`].
    pub const fn new(s: &str) -> HashId {
        let bytes = s.as_bytes();
        if bytes.is_empty() {
            return HashId::NONE;
        }
        let mut hash: u32 = 2_166_136_261;
        let mut i = 0;
        while i < bytes.len() {
            hash = hash.wrapping_mul(16_777_619);
            hash ^= bytes[i] as u32;
            i += 1;
        }
        HashId(hash)
    }

    /// Whether this is the empty id.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<&str> for HashId {
    fn from(s: &str) -> Self {
        HashId::new(s)
    }
}

impl From<u32> for HashId {
    fn from(v: u32) -> Self {
        HashId(v)
    }
}

impl fmt::Debug for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashId({:#010x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string_is_none() {
        assert_eq!(HashId::new(""), HashId::NONE);
        assert!(HashId::new("").is_none());
    }

    #[test]
    fn test_fnv1_reference_values() {
        // FNV-1 (multiply, then xor).
        assert_eq!(HashId::new("a").0, 0x050c5d7e);
        assert_eq!(HashId::new("foobar").0, 0x31f0b262);
    }

    #[test]
    fn test_same_string_same_id() {
        assert_eq!(HashId::from("ok-button"), HashId::new("ok-button"));
        assert_ne!(HashId::new("ok"), HashId::new("cancel"));
    }
}
