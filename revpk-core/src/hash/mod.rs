//! Content fingerprinting used for pack-time chunk deduplication.

use xxhash_rust::xxh3::xxh3_64;

/// 16-character lowercase hex fingerprint of `bytes`. Deterministic across
/// runs and platforms; collisions between distinct chunks are treated as
/// equal chunks, per the format's own invariant.
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:016x}", xxh3_64(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_and_16_chars() {
        let a = fingerprint(b"hello world");
        let b = fingerprint(b"hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn distinguishes_distinct_input() {
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
    }
}
