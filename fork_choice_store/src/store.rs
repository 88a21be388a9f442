use anyhow::{ensure, Result};
use im::{HashMap, Vector};
use log::{debug, warn};
use types::phase0::{containers::BeaconBlockHeader, primitives::H256};

use crate::{
    error::Error,
    misc::{ChainLink, ForkChoiceScoring},
};

#[derive(Clone, Debug)]
pub struct Store {
    genesis_root: H256,
    justified_root: H256,
    // The head selected by the last call to `Store::update_head`.
    // Only used to detect head changes.
    head_root: H256,
    chain_links: HashMap<H256, ChainLink>,
    children: HashMap<H256, Vector<H256>>,
}

impl Store {
    #[must_use]
    pub fn new(genesis_block: BeaconBlockHeader) -> Self {
        let genesis = ChainLink::new(genesis_block);
        let genesis_root = genesis.block_root;

        Self {
            genesis_root,
            justified_root: genesis_root,
            head_root: genesis_root,
            chain_links: HashMap::unit(genesis_root, genesis),
            children: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn genesis_root(&self) -> H256 {
        self.genesis_root
    }

    #[must_use]
    pub const fn justified_root(&self) -> H256 {
        self.justified_root
    }

    #[must_use]
    pub fn contains_block(&self, block_root: H256) -> bool {
        self.chain_links.contains_key(&block_root)
    }

    #[must_use]
    pub fn chain_link(&self, block_root: H256) -> Option<&ChainLink> {
        self.chain_links.get(&block_root)
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.chain_links.len()
    }

    /// Adds `block` to the store and returns its root.
    ///
    /// Inserting a block that is already present has no effect.
    pub fn insert(&mut self, block: BeaconBlockHeader) -> Result<H256> {
        let chain_link = ChainLink::new(block);
        let block_root = chain_link.block_root;
        let parent_root = chain_link.parent_root();

        if self.contains_block(block_root) {
            return Ok(block_root);
        }

        let Some(parent) = self.chain_link(parent_root) else {
            warn!("rejecting block {block_root:?} with unknown parent {parent_root:?}");

            return Err(Error::UnknownParent {
                block_root,
                parent_root,
            }
            .into());
        };

        ensure!(
            parent.slot() < chain_link.slot(),
            Error::SlotNotAfterParent {
                block_root,
                block_slot: chain_link.slot(),
                parent_slot: parent.slot(),
            },
        );

        self.chain_links.insert(block_root, chain_link);
        self.children.entry(parent_root).or_default().push_back(block_root);

        Ok(block_root)
    }

    /// Restricts head selection to descendants of `block_root`.
    pub fn set_justified_root(&mut self, block_root: H256) -> Result<()> {
        ensure!(
            self.contains_block(block_root),
            Error::UnknownJustifiedBlock { block_root },
        );

        self.justified_root = block_root;

        Ok(())
    }

    /// The block with the greatest score among the justified block and its descendants.
    #[must_use]
    pub fn head(&self, scoring: &impl ForkChoiceScoring) -> &ChainLink {
        self.descendants(self.justified_root)
            .max_by_key(|chain_link| scoring.score(chain_link))
            .expect("the justified block is in the store and is its own descendant")
    }

    /// Same as [`Store::head`], but remembers the result and logs when it changes.
    pub fn update_head(&mut self, scoring: &impl ForkChoiceScoring) -> H256 {
        let head = self.head(scoring);
        let new_head_root = head.block_root;

        if new_head_root != self.head_root {
            debug!(
                "head changed from {:?} to {new_head_root:?} (slot: {})",
                self.head_root,
                head.slot(),
            );

            self.head_root = new_head_root;
        }

        new_head_root
    }

    fn descendants(&self, block_root: H256) -> impl Iterator<Item = &ChainLink> {
        let mut pending = vec![block_root];

        core::iter::from_fn(move || {
            let block_root = pending.pop()?;

            if let Some(children) = self.children.get(&block_root) {
                pending.extend(children.iter().copied());
            }

            self.chain_link(block_root)
        })
    }
}
