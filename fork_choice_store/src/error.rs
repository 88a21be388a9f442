use thiserror::Error;
use types::phase0::primitives::{Slot, H256};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("block {block_root:?} has unknown parent {parent_root:?}")]
    UnknownParent { block_root: H256, parent_root: H256 },
    #[error("justified block {block_root:?} is not in the store")]
    UnknownJustifiedBlock { block_root: H256 },
    #[error(
        "block {block_root:?} is not later than its parent \
         (block_slot: {block_slot}, parent_slot: {parent_slot})"
    )]
    SlotNotAfterParent {
        block_root: H256,
        block_slot: Slot,
        parent_slot: Slot,
    },
}
