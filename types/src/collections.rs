//! Collections used in `BeaconState`.
//!
//! All of them share structure between consecutive states.

use ssz::{PersistentList, PersistentVector};

use crate::{
    phase0::{
        containers::{Crosslink, Eth1Data, PendingAttestation, Validator},
        primitives::{Gwei, H256},
    },
    preset::Preset,
};

pub type RecentRoots<P> = PersistentVector<H256, <P as Preset>::SlotsPerHistoricalRoot>;

pub type HistoricalRoots = PersistentList<H256>;

pub type Eth1DataVotes = PersistentList<Eth1Data>;

pub type Validators = PersistentList<Validator>;

pub type Balances = PersistentList<Gwei>;

pub type RandaoMixes<P> = PersistentVector<H256, <P as Preset>::EpochsPerHistoricalVector>;

pub type ActiveIndexRoots<P> = PersistentVector<H256, <P as Preset>::EpochsPerHistoricalVector>;

pub type SlashedBalances<P> = PersistentVector<Gwei, <P as Preset>::EpochsPerSlashedBalancesVector>;

pub type Attestations = PersistentList<PendingAttestation>;

pub type Crosslinks<P> = PersistentVector<Crosslink, <P as Preset>::ShardCount>;
