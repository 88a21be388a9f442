//! Head selection over a tree of known blocks.
//!
//! The store keeps every accepted block header keyed by its signing root along with links from
//! parents to children. Head selection walks the subtree rooted at the justified block and picks
//! the block with the greatest score. Scoring policies are pluggable through
//! [`ForkChoiceScoring`]. [`HigherSlotScoring`] is the baseline policy.
//!
//! Blocks are only accepted when their parent is already known, so every stored block is
//! reachable from the genesis block. The store never removes blocks.
//!
//! The store uses persistent collections from [`im`], so cloning it to take a snapshot is cheap.

pub use crate::{
    error::Error,
    misc::{ChainLink, ForkChoiceScoring, HigherSlotScore, HigherSlotScoring, Score},
    store::Store,
};

mod error;
mod misc;
mod store;
