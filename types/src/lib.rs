pub mod config;
pub mod error;
pub mod nonstandard;
pub mod preset;

pub mod phase0 {
    pub mod beacon_state;
    pub mod consts;
    pub mod containers;
    pub mod primitives;

    mod container_impls;
}

mod collections;

pub use collections::{
    ActiveIndexRoots, Attestations, Balances, Crosslinks, Eth1DataVotes, HistoricalRoots,
    RandaoMixes, RecentRoots, SlashedBalances, Validators,
};
