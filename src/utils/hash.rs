//! Hashing utilities using FxHash.
//!
//! Uses `rustc_hash::FxHasher` for fast, deterministic 64-bit hashes.
//! Dedup keys for style/script elements are computed with [`compute`].

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_deterministic() {
        assert_eq!(compute("abc"), compute("abc"));
        assert_eq!(compute(b"abc".as_slice()), compute("abc"));
    }

    #[test]
    fn test_compute_distinguishes() {
        assert_ne!(compute("style.css"), compute("other.css"));
        assert_ne!(compute(""), compute(" "));
    }
}
