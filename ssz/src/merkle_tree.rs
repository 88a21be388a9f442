use ethereum_types::H256;
use hashing::zero_hash;
use itertools::Itertools as _;

/// Depth of the smallest complete binary tree with at least `chunk_count` leaves.
#[must_use]
pub const fn depth_for_chunks(chunk_count: usize) -> usize {
    let mut depth = 0;

    while (1 << depth) < chunk_count {
        depth += 1;
    }

    depth
}

/// Computes the root of a tree of the given depth, padding missing leaves with zero chunks.
///
/// # Panics
///
/// Panics if there are more than `2 ** depth` chunks.
#[must_use]
pub fn merkleize_chunks(chunks: impl IntoIterator<Item = H256>, depth: usize) -> H256 {
    let mut layer = chunks.into_iter().collect_vec();

    assert!(layer.len() <= 1 << depth);

    if layer.is_empty() {
        return zero_hash(depth);
    }

    for height in 0..depth {
        if layer.len() % 2 == 1 {
            layer.push(zero_hash(height));
        }

        layer = layer
            .into_iter()
            .tuples()
            .map(|(left, right)| hashing::hash_256_256(left, right))
            .collect();
    }

    layer[0]
}

/// Root of a container whose field roots are `roots`.
#[must_use]
pub fn merkleize_fields(roots: impl IntoIterator<Item = H256>) -> H256 {
    let roots = roots.into_iter().collect_vec();
    let depth = depth_for_chunks(roots.len());
    merkleize_chunks(roots, depth)
}

/// Root of a fixed-length byte vector such as a public key or signature.
#[must_use]
pub fn merkleize_bytes(bytes: impl AsRef<[u8]>) -> H256 {
    let chunks = bytes
        .as_ref()
        .chunks(H256::len_bytes())
        .map(|partial_chunk| {
            let mut chunk = H256::zero();
            chunk[..partial_chunk.len()].copy_from_slice(partial_chunk);
            chunk
        })
        .collect_vec();

    let depth = depth_for_chunks(chunks.len());

    merkleize_chunks(chunks, depth)
}

#[must_use]
pub fn mix_in_length(root: H256, length: usize) -> H256 {
    let mut length_chunk = H256::zero();
    length_chunk[..size_of::<u64>()].copy_from_slice(&(length as u64).to_le_bytes());
    hashing::hash_256_256(root, length_chunk)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(0 => 0)]
    #[test_case(1 => 0)]
    #[test_case(2 => 1)]
    #[test_case(3 => 2)]
    #[test_case(4 => 2)]
    #[test_case(5 => 3)]
    #[test_case(2048 => 11)]
    fn depth_for_chunks_rounds_up_to_power_of_two(chunk_count: usize) -> usize {
        depth_for_chunks(chunk_count)
    }

    #[test]
    fn missing_leaves_are_zero_chunks() {
        let leaf = H256::repeat_byte(7);

        let padded = merkleize_chunks([leaf, H256::zero(), H256::zero()], 2);
        let implicit = merkleize_chunks([leaf], 2);

        assert_eq!(padded, implicit);
    }

    #[test]
    fn empty_tree_is_zero_hash() {
        assert_eq!(merkleize_chunks(core::iter::empty(), 3), zero_hash(3));
    }

    #[test]
    fn forty_eight_bytes_take_two_chunks() {
        let bytes = [0xaa; 48];

        let mut second = H256::zero();
        second[..16].copy_from_slice(&bytes[32..]);

        let expected = hashing::hash_256_256(H256::repeat_byte(0xaa), second);

        assert_eq!(merkleize_bytes(bytes), expected);
    }

    #[test]
    fn single_field_container_root_is_field_root() {
        let root = H256::repeat_byte(3);
        assert_eq!(merkleize_fields([root]), root);
    }
}
