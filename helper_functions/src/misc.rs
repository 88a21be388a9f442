use core::{num::NonZeroU64, ops::Div as _};

use arithmetic::U64Ext as _;
use typenum::Unsigned as _;
use types::{
    phase0::{
        consts::BASE_REWARDS_PER_EPOCH,
        primitives::{Domain, DomainType, Epoch, Gwei, Slot, ValidatorIndex, Version, H256},
    },
    preset::Preset,
};

#[must_use]
pub fn compute_epoch_at_slot<P: Preset>(slot: Slot) -> Epoch {
    slot.div_typenum::<P::SlotsPerEpoch>()
}

#[must_use]
pub const fn compute_start_slot_at_epoch<P: Preset>(epoch: Epoch) -> Slot {
    epoch.saturating_mul(P::SlotsPerEpoch::U64)
}

#[must_use]
pub fn is_epoch_start<P: Preset>(slot: Slot) -> bool {
    slots_since_epoch_start::<P>(slot) == 0
}

#[must_use]
pub fn slots_since_epoch_start<P: Preset>(slot: Slot) -> u64 {
    slot.mod_typenum::<P::SlotsPerEpoch>()
}

// > An entry or exit triggered in the ``epoch`` given by the input takes effect at
// > the epoch given by the output.
#[must_use]
pub const fn compute_activation_exit_epoch<P: Preset>(epoch: Epoch) -> Epoch {
    epoch + 1 + P::ACTIVATION_EXIT_DELAY
}

/// Packs `domain_type` and `fork_version` into the 8 byte domain that signatures are made over.
///
/// The bytes are read in big-endian order so that `Domain::to_be_bytes` restores them.
#[must_use]
pub fn compute_domain(domain_type: DomainType, fork_version: Version) -> Domain {
    let mut bytes = [0; size_of::<Domain>()];
    bytes[..DomainType::len_bytes()].copy_from_slice(domain_type.as_bytes());
    bytes[DomainType::len_bytes()..].copy_from_slice(fork_version.as_bytes());
    Domain::from_be_bytes(bytes)
}

#[must_use]
pub fn committee_count_from_active_validator_count<P: Preset>(active_validator_count: u64) -> u64 {
    let committees_per_slot = active_validator_count
        .div_typenum::<P::SlotsPerEpoch>()
        .div(P::TARGET_COMMITTEE_SIZE)
        .min(P::ShardCount::U64.div_typenum::<P::SlotsPerEpoch>())
        .max(1);

    committees_per_slot * P::SlotsPerEpoch::U64
}

#[must_use]
pub fn shard_delta_from_committee_count<P: Preset>(committee_count: u64) -> u64 {
    let shard_count = P::ShardCount::U64;
    committee_count.min(shard_count - shard_count.div_typenum::<P::SlotsPerEpoch>())
}

/// Base reward of a validator with `effective_balance`.
///
/// Every division truncates. `total_active_balance` is at least 1 when obtained through
/// [`crate::accessors::get_total_active_balance`].
#[must_use]
pub fn compute_base_reward<P: Preset>(effective_balance: Gwei, total_active_balance: Gwei) -> Gwei {
    let balance_sqrt = NonZeroU64::new(arithmetic::integer_squareroot(total_active_balance))
        .unwrap_or(NonZeroU64::MIN);

    effective_balance * P::BASE_REWARD_FACTOR / balance_sqrt / BASE_REWARDS_PER_EPOCH
}

pub(crate) fn compute_shuffled_index<P: Preset>(
    index: ValidatorIndex,
    index_count: NonZeroU64,
    seed: H256,
) -> ValidatorIndex {
    shuffling::shuffle_single::<P>(index, index_count, seed)
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use test_case::test_case;
    use types::{
        phase0::{
            consts::{DOMAIN_ATTESTATION, DOMAIN_RANDAO},
            primitives::H32,
        },
        preset::{Mainnet, Minimal},
    };

    use super::*;

    #[test_case(0 => 0)]
    #[test_case(7 => 0)]
    #[test_case(8 => 1)]
    #[test_case(17 => 2)]
    fn compute_epoch_at_slot_divides_by_slots_per_epoch(slot: Slot) -> Epoch {
        compute_epoch_at_slot::<Minimal>(slot)
    }

    #[test]
    fn compute_domain_puts_domain_type_first() {
        let fork_version = H32(hex!("00000001"));

        assert_eq!(
            compute_domain(DOMAIN_ATTESTATION, fork_version).to_be_bytes(),
            hex!("02000000 00000001"),
        );

        assert_eq!(compute_domain(DOMAIN_RANDAO, H32::zero()), 0x0100_0000_0000_0000);
    }

    #[test_case(0)]
    #[test_case(32)]
    #[test_case(1_000_000)]
    fn committee_count_minimal_is_capped_at_one_per_slot(active_validator_count: u64) {
        assert_eq!(
            committee_count_from_active_validator_count::<Minimal>(active_validator_count),
            8,
        );
    }

    #[test_case(0 => 64)]
    #[test_case(16_384 => 128)]
    #[test_case(65_536 => 512)]
    #[test_case(10_000_000 => 1024)]
    fn committee_count_mainnet(active_validator_count: u64) -> u64 {
        committee_count_from_active_validator_count::<Mainnet>(active_validator_count)
    }

    #[test_case(64 => 64)]
    #[test_case(1024 => 1008)]
    fn shard_delta_mainnet(committee_count: u64) -> u64 {
        shard_delta_from_committee_count::<Mainnet>(committee_count)
    }

    #[test]
    fn base_reward_matches_integer_reference() {
        let effective_balance = 32_000_000_000;
        let total_active_balance = 100 * 32_000_000_000;

        // integer_squareroot(3_200_000_000_000) = 1_788_854
        let expected = 32_000_000_000 * 64 / 1_788_854 / 5;

        assert_eq!(expected, 228_973);
        assert_eq!(
            compute_base_reward::<Mainnet>(effective_balance, total_active_balance),
            expected,
        );
    }
}
