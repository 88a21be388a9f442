use core::{fmt::Debug, hash::Hash, num::NonZeroU64};

use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use typenum::{NonZero, Unsigned, U1024, U16, U4096, U64, U65536, U8, U8192};

use crate::{config::Config, phase0::primitives::Gwei};

/// Compile-time configuration variables.
///
/// The associated types fix the lengths of vectors in `BeaconState`, so a state built for one
/// preset can never be processed with the sizes of another.
pub trait Preset: Copy + Eq + Ord + Hash + Default + Debug + Send + Sync + 'static {
    type EpochsPerHistoricalVector: Unsigned + NonZero + Debug + Send + Sync;
    type EpochsPerSlashedBalancesVector: Unsigned + NonZero + Debug + Send + Sync;
    type MaxIndicesPerAttestation: Unsigned + NonZero + Debug + Send + Sync;
    type ShardCount: Unsigned + NonZero + Debug + Send + Sync;
    type SlotsPerEpoch: Unsigned + NonZero + Debug + Send + Sync;
    type SlotsPerEth1VotingPeriod: Unsigned + NonZero + Debug + Send + Sync;
    type SlotsPerHistoricalRoot: Unsigned + NonZero + Debug + Send + Sync;

    // Meta
    const NAME: PresetName;

    // Misc
    const SHUFFLE_ROUND_COUNT: u8 = 90;
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(128_u64);

    // Gwei values
    const EFFECTIVE_BALANCE_INCREMENT: NonZeroU64 = nonzero!(1_000_000_000_u64);
    const MAX_EFFECTIVE_BALANCE: Gwei = 32_000_000_000;
    const MIN_DEPOSIT_AMOUNT: Gwei = 1_000_000_000;

    // Time parameters
    const ACTIVATION_EXIT_DELAY: u64 = 4;
    const MAX_EPOCHS_PER_CROSSLINK: u64 = 64;
    const MIN_ATTESTATION_INCLUSION_DELAY: NonZeroU64 = NonZeroU64::MIN;
    const MIN_EPOCHS_TO_INACTIVITY_PENALTY: u64 = 4;
    const MIN_SEED_LOOKAHEAD: u64 = 1;

    // Reward and penalty quotients
    const BASE_REWARD_FACTOR: u64 = 64;
    const INACTIVITY_PENALTY_QUOTIENT: NonZeroU64 = nonzero!(1_u64 << 25);
    const MIN_SLASHING_PENALTY_QUOTIENT: NonZeroU64 = nonzero!(32_u64);
    const PROPOSER_REWARD_QUOTIENT: NonZeroU64 = nonzero!(8_u64);
    const WHISTLEBLOWING_REWARD_QUOTIENT: NonZeroU64 = nonzero!(512_u64);

    /// Returns the default configuration associated with a preset.
    ///
    /// This should only be used in tests and benchmarks.
    #[must_use]
    fn default_config() -> Config {
        Self::NAME.default_config()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Mainnet;

impl Preset for Mainnet {
    type EpochsPerHistoricalVector = U65536;
    type EpochsPerSlashedBalancesVector = U8192;
    type MaxIndicesPerAttestation = U4096;
    type ShardCount = U1024;
    type SlotsPerEpoch = U64;
    type SlotsPerEth1VotingPeriod = U1024;
    type SlotsPerHistoricalRoot = U8192;

    const NAME: PresetName = PresetName::Mainnet;
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Minimal;

impl Preset for Minimal {
    type EpochsPerHistoricalVector = U64;
    type EpochsPerSlashedBalancesVector = U64;
    type MaxIndicesPerAttestation = <Mainnet as Preset>::MaxIndicesPerAttestation;
    type ShardCount = U8;
    type SlotsPerEpoch = U8;
    type SlotsPerEth1VotingPeriod = U16;
    type SlotsPerHistoricalRoot = U64;

    const NAME: PresetName = PresetName::Minimal;

    const MAX_EPOCHS_PER_CROSSLINK: u64 = 4;
    const SHUFFLE_ROUND_COUNT: u8 = 10;
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(4_u64);
}

#[derive(
    Clone, Copy, PartialEq, Eq, Default, Debug, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    #[default]
    Mainnet,
    Minimal,
}

impl PresetName {
    #[must_use]
    pub fn default_config(self) -> Config {
        match self {
            Self::Mainnet => Config::mainnet(),
            Self::Minimal => Config::minimal(),
        }
    }
}
