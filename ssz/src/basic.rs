use ethereum_types::{H256, H32};
use itertools::Itertools as _;
use typenum::{U1, U32, U4};

use crate::{merkle_tree::merkleize_bytes, porcelain::SszHash};

impl SszHash for bool {
    type PackingFactor = U32;

    #[inline]
    fn hash_tree_root(&self) -> H256 {
        let mut hash = H256::zero();
        hash.as_bytes_mut()[0] = (*self).into();
        hash
    }

    fn chunks<'value>(values: impl IntoIterator<Item = &'value Self>) -> Vec<H256> {
        pack(values.into_iter().map(|value| [u8::from(*value)]))
    }
}

impl SszHash for u8 {
    type PackingFactor = U32;

    #[inline]
    fn hash_tree_root(&self) -> H256 {
        let mut hash = H256::zero();
        hash.as_bytes_mut()[0] = *self;
        hash
    }

    fn chunks<'value>(values: impl IntoIterator<Item = &'value Self>) -> Vec<H256> {
        pack(values.into_iter().map(|value| [*value]))
    }
}

impl SszHash for u64 {
    type PackingFactor = U4;

    #[inline]
    fn hash_tree_root(&self) -> H256 {
        let mut hash = H256::zero();
        hash[..size_of::<Self>()].copy_from_slice(&self.to_le_bytes());
        hash
    }

    fn chunks<'value>(values: impl IntoIterator<Item = &'value Self>) -> Vec<H256> {
        pack(values.into_iter().map(|value| value.to_le_bytes()))
    }
}

impl SszHash for H32 {
    type PackingFactor = U1;

    #[inline]
    fn hash_tree_root(&self) -> H256 {
        merkleize_bytes(self)
    }
}

impl SszHash for H256 {
    type PackingFactor = U1;

    #[inline]
    fn hash_tree_root(&self) -> H256 {
        *self
    }
}

fn pack<const SIZE: usize>(serialized: impl IntoIterator<Item = [u8; SIZE]>) -> Vec<H256> {
    serialized
        .into_iter()
        .chunks(H256::len_bytes() / SIZE)
        .into_iter()
        .map(|values| {
            let mut chunk = H256::zero();

            for (destination, bytes) in chunk.as_bytes_mut().chunks_exact_mut(SIZE).zip(values) {
                destination.copy_from_slice(&bytes);
            }

            chunk
        })
        .collect()
}
