use core::fmt::Debug;

use types::phase0::{
    containers::BeaconBlockHeader,
    primitives::{Slot, H256},
};

/// A value attached to a candidate head. The greatest score wins.
///
/// The order must be total so that every node selects the same head.
pub trait Score: Ord + Copy + Debug {}

impl<T: Ord + Copy + Debug> Score for T {}

/// Scoring policy used by [`Store::head`].
///
/// Scores must depend only on the block being scored.
///
/// [`Store::head`]: crate::Store::head
pub trait ForkChoiceScoring {
    type Score: Score;

    fn score(&self, chain_link: &ChainLink) -> Self::Score;
}

/// Orders blocks by slot and then by root.
///
/// Block roots are unique, so two distinct blocks never have equal scores.
/// Field order matters because `Ord` is derived.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct HigherSlotScore {
    pub slot: Slot,
    pub root: H256,
}

#[derive(Clone, Copy, Default, Debug)]
pub struct HigherSlotScoring;

impl ForkChoiceScoring for HigherSlotScoring {
    type Score = HigherSlotScore;

    fn score(&self, chain_link: &ChainLink) -> Self::Score {
        HigherSlotScore {
            slot: chain_link.slot(),
            root: chain_link.block_root,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ChainLink {
    pub block_root: H256,
    pub block: BeaconBlockHeader,
}

impl ChainLink {
    #[must_use]
    pub fn new(block: BeaconBlockHeader) -> Self {
        Self {
            block_root: block.signing_root(),
            block,
        }
    }

    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.block.slot
    }

    #[must_use]
    pub const fn parent_root(&self) -> H256 {
        self.block.parent_root
    }
}
