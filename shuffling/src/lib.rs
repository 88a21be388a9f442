use core::{
    num::NonZeroU64,
    ops::{Index as _, Rem as _},
};

use bit_field::BitArray as _;
use types::{phase0::primitives::H256, preset::Preset};

const BITS_PER_HASH: u64 = H256::len_bytes() as u64 * 8;

/// Position that the element at `index` moves to after swap-or-not shuffling `index_count`
/// elements with `seed`.
///
/// Committees are built by mapping every position through this, so it must be a permutation of
/// `0..index_count` for every seed.
#[must_use]
pub fn shuffle_single<P: Preset>(mut index: u64, index_count: NonZeroU64, seed: H256) -> u64 {
    assert!(index < index_count.get());

    for round in 0..P::SHUFFLE_ROUND_COUNT {
        let pivot = compute_pivot(seed, round, index_count);
        let flip = (pivot + index_count.get() - index) % index_count;
        let position = index.max(flip);
        let source = compute_source(seed, round, position / BITS_PER_HASH);
        let bit_index = position.to_le_bytes()[0].into();

        if source.as_bytes().get_bit(bit_index) {
            index = flip;
        }
    }

    index
}

fn compute_pivot(seed: H256, round: u8, index_count: NonZeroU64) -> u64 {
    hashing::hash_256_8(seed, round)
        .index(..size_of::<u64>())
        .try_into()
        .map(u64::from_le_bytes)
        .expect("slice has the same size as u64")
        .rem(index_count)
}

fn compute_source(seed: H256, round: u8, position_window: u64) -> H256 {
    // Only the low 4 bytes of the window take part in the hash.
    #[allow(clippy::cast_possible_truncation)]
    hashing::hash_256_8_32(seed, round, position_window as u32)
}
