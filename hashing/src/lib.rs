use ethereum_types::H256;
use once_cell::sync::Lazy;
use sha2::{Digest as _, Sha256};

/// Deepest subtree handled by [`zero_hash`].
///
/// Lists are merkleized without a length limit, so the depth is bounded only by the number of
/// elements that fit in a `u64`.
pub const MAX_DEPTH: usize = 64;

static ZERO_HASHES: Lazy<[H256; MAX_DEPTH + 1]> = Lazy::new(|| {
    let mut hashes = [H256::zero(); MAX_DEPTH + 1];

    for depth in 1..=MAX_DEPTH {
        hashes[depth] = hash_256_256(hashes[depth - 1], hashes[depth - 1]);
    }

    hashes
});

/// Root of a Merkle tree of the given depth whose leaves are all zero chunks.
#[inline]
#[must_use]
pub fn zero_hash(depth: usize) -> H256 {
    ZERO_HASHES[depth]
}

#[inline]
#[must_use]
pub fn hash(bytes: impl AsRef<[u8]>) -> H256 {
    H256(Sha256::digest(bytes).into())
}

#[inline]
#[must_use]
pub fn hash_256_256(left: H256, right: H256) -> H256 {
    let digest = Sha256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize();

    H256(digest.into())
}

#[inline]
#[must_use]
pub fn hash_256_256_256(a: H256, b: H256, c: H256) -> H256 {
    let digest = Sha256::new()
        .chain_update(a)
        .chain_update(b)
        .chain_update(c)
        .finalize();

    H256(digest.into())
}

#[inline]
#[must_use]
pub fn hash_256_8(a: H256, b: u8) -> H256 {
    let digest = Sha256::new().chain_update(a).chain_update([b]).finalize();
    H256(digest.into())
}

#[inline]
#[must_use]
pub fn hash_256_8_32(a: H256, b: u8, c: u32) -> H256 {
    let digest = Sha256::new()
        .chain_update(a)
        .chain_update([b])
        .chain_update(c.to_le_bytes())
        .finalize();

    H256(digest.into())
}

#[inline]
#[must_use]
pub fn hash_256_64(a: H256, b: u64) -> H256 {
    let digest = Sha256::new()
        .chain_update(a)
        .chain_update(b.to_le_bytes())
        .finalize();

    H256(digest.into())
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use itertools::Itertools as _;

    use super::*;

    #[test]
    fn higher_zero_hashes_are_calculated_from_lower_ones() {
        for (lower, higher) in (0..=MAX_DEPTH).map(zero_hash).tuple_windows() {
            assert_eq!(hash_256_256(lower, lower), higher);
        }
    }

    #[test]
    fn zero_hashes_match_known_values() {
        assert_eq!(zero_hash(0), H256::zero());
        assert_eq!(
            zero_hash(1),
            H256(hex!(
                "f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b"
            )),
        );
        assert_eq!(
            zero_hash(2),
            H256(hex!(
                "db56114e00fdd4c1f85c892bf35ac9a89289aaecb1ebd0a96cde606a748b5d71"
            )),
        );
    }

    #[test]
    fn specialized_functions_match_hash_of_concatenation() {
        let seed = H256::repeat_byte(0xab);

        let mut expected = seed.as_bytes().to_vec();
        expected.push(7);
        expected.extend_from_slice(&9_u32.to_le_bytes());

        assert_eq!(hash_256_8_32(seed, 7, 9), hash(&expected));
        assert_eq!(hash_256_8(seed, 7), hash(&expected[..33]));

        let mut expected = seed.as_bytes().to_vec();
        expected.extend_from_slice(&5_u64.to_le_bytes());

        assert_eq!(hash_256_64(seed, 5), hash(expected));
    }
}
