use ethereum_types::H256;
use typenum::{NonZero, Unsigned};

pub trait SszHash {
    /// Number of values of this type that fit in one 32 byte chunk.
    ///
    /// Composite types take a whole chunk each.
    type PackingFactor: Unsigned + NonZero;

    fn hash_tree_root(&self) -> H256;

    /// Converts a sequence of values into the chunks that form the leaves of their Merkle tree.
    ///
    /// Basic types override this to pack multiple values into each chunk.
    fn chunks<'value>(values: impl IntoIterator<Item = &'value Self>) -> Vec<H256>
    where
        Self: 'value,
    {
        values.into_iter().map(Self::hash_tree_root).collect()
    }
}
