use core::num::NonZeroU64;

use anyhow::{ensure, Result};
use itertools::Itertools as _;
use ssz::{Bitfield, SszHash as _};
use tap::{Pipe as _, TryConv as _};
use typenum::Unsigned as _;
use types::{
    config::Config,
    nonstandard::AttestationEpoch,
    phase0::{
        beacon_state::BeaconState,
        consts::{GENESIS_EPOCH, MAX_RANDOM_BYTE},
        containers::{Attestation, AttestationData, IndexedAttestation},
        primitives::{Domain, DomainType, Epoch, Gwei, Shard, Slot, ValidatorIndex, H256},
    },
    preset::Preset,
};

use crate::{error::Error, misc, predicates};

#[must_use]
pub fn get_current_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    misc::compute_epoch_at_slot::<P>(state.slot)
}

#[must_use]
pub fn get_previous_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    get_current_epoch(state)
        .saturating_sub(1)
        .max(GENESIS_EPOCH)
}

#[must_use]
pub fn get_next_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    get_current_epoch(state) + 1
}

/// Classifies `epoch` relative to `state`.
///
/// At genesis the previous and current epochs coincide. `AttestationEpoch::Current` wins then.
pub fn attestation_epoch<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
) -> Result<AttestationEpoch> {
    if epoch == get_current_epoch(state) {
        Ok(AttestationEpoch::Current)
    } else if epoch == get_previous_epoch(state) {
        Ok(AttestationEpoch::Previous)
    } else {
        Err(Error::EpochNotPreviousOrCurrent { epoch }.into())
    }
}

#[must_use]
pub fn get_finality_delay<P: Preset>(state: &BeaconState<P>) -> u64 {
    get_previous_epoch(state).saturating_sub(state.finalized_epoch)
}

pub fn get_block_root_at_slot<P: Preset>(state: &BeaconState<P>, slot: Slot) -> Result<H256> {
    ensure!(slot < state.slot, Error::SlotOutOfRange { slot });

    ensure!(
        state.slot <= slot + P::SlotsPerHistoricalRoot::U64,
        Error::SlotOutOfRange { slot },
    );

    Ok(*state.block_roots.mod_index(slot))
}

pub fn get_block_root<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> Result<H256> {
    get_block_root_at_slot(state, misc::compute_start_slot_at_epoch::<P>(epoch))
}

#[must_use]
pub fn get_randao_mix<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> H256 {
    *state.randao_mixes.mod_index(epoch)
}

#[must_use]
pub fn get_active_index_root<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> H256 {
    *state.active_index_roots.mod_index(epoch)
}

pub fn get_active_validator_indices<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
) -> impl Iterator<Item = ValidatorIndex> + '_ {
    (0..)
        .zip(state.validators())
        .filter(move |(_, validator)| predicates::is_active_validator(validator, epoch))
        .map(|(index, _)| index)
}

/// Root of the list of validator indices active in `epoch`.
#[must_use]
pub fn compute_active_index_root<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> H256 {
    get_active_validator_indices(state, epoch)
        .collect_vec()
        .hash_tree_root()
}

#[must_use]
pub fn active_validator_count<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> u64 {
    state
        .validators()
        .into_iter()
        .filter(|validator| predicates::is_active_validator(validator, epoch))
        .count()
        .try_conv::<u64>()
        .expect("number of validators fits in u64")
}

#[must_use]
pub fn get_epoch_committee_count<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> u64 {
    misc::committee_count_from_active_validator_count::<P>(active_validator_count(state, epoch))
}

#[must_use]
pub fn get_shard_delta<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> u64 {
    misc::shard_delta_from_committee_count::<P>(get_epoch_committee_count(state, epoch))
}

pub fn get_epoch_start_shard<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> Result<Shard> {
    let shard_count = P::ShardCount::U64;
    let current_epoch = get_current_epoch(state);
    let mut check_epoch = get_next_epoch(state);

    ensure!(epoch <= check_epoch, Error::EpochAfterNext { epoch });

    let mut shard = (state.start_shard + get_shard_delta(state, current_epoch)) % shard_count;

    while check_epoch > epoch {
        check_epoch -= 1;
        shard = (shard + shard_count - get_shard_delta(state, check_epoch)) % shard_count;
    }

    Ok(shard)
}

#[must_use]
pub fn get_seed<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> H256 {
    let mix = get_randao_mix(
        state,
        epoch + P::EpochsPerHistoricalVector::U64 - P::MIN_SEED_LOOKAHEAD - 1,
    );

    let active_index_root = get_active_index_root(state, epoch);
    let mut epoch_bytes = H256::zero();
    epoch_bytes[..size_of::<Epoch>()].copy_from_slice(&epoch.to_le_bytes());

    hashing::hash_256_256_256(mix, active_index_root, epoch_bytes)
}

/// Members of the committee attesting to `shard` in `epoch`, in shuffled order.
///
/// Shards without a committee in `epoch` yield an empty committee.
pub fn get_crosslink_committee<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
    shard: Shard,
) -> Result<Vec<ValidatorIndex>> {
    let shard_count = P::ShardCount::U64;

    ensure!(shard < shard_count, Error::ShardOutOfRange { shard });

    let start_shard = get_epoch_start_shard(state, epoch)?;
    let committee_index = (shard + shard_count - start_shard) % shard_count;
    let indices = get_active_validator_indices(state, epoch).collect_vec();
    let committee_count = misc::committee_count_from_active_validator_count::<P>(
        indices.len().try_conv::<u64>()?,
    );

    let Some(index_count) = NonZeroU64::new(indices.len().try_into()?) else {
        return Ok(vec![]);
    };

    if committee_index >= committee_count {
        return Ok(vec![]);
    }

    let seed = get_seed(state, epoch);
    let start = index_count.get() * committee_index / committee_count;
    let end = index_count.get() * (committee_index + 1) / committee_count;

    (start..end)
        .map(|position| {
            let shuffled = misc::compute_shuffled_index::<P>(position, index_count, seed);
            Ok(indices[shuffled.try_conv::<usize>()?])
        })
        .collect()
}

pub fn get_beacon_proposer_index<P: Preset>(state: &BeaconState<P>) -> Result<ValidatorIndex> {
    let current_epoch = get_current_epoch(state);
    let committees_per_slot =
        get_epoch_committee_count(state, current_epoch) / P::SlotsPerEpoch::U64;
    let offset = committees_per_slot * misc::slots_since_epoch_start::<P>(state.slot);
    let shard = (get_epoch_start_shard(state, current_epoch)? + offset) % P::ShardCount::U64;
    let first_committee = get_crosslink_committee(state, current_epoch, shard)?;

    let committee_size = first_committee
        .len()
        .try_conv::<u64>()?
        .pipe(NonZeroU64::new)
        .ok_or(Error::NoActiveValidators)?;

    let seed = get_seed(state, current_epoch);

    let random_bytes = (0..u64::MAX / H256::len_bytes() as u64).flat_map(|quotient| {
        hashing::hash_256_64(seed, quotient)
            .to_fixed_bytes()
            .into_iter()
            .map(u64::from)
    });

    for (random_byte, attempt) in random_bytes.zip(0..) {
        let position = ((current_epoch + attempt) % committee_size).try_conv::<usize>()?;
        let candidate_index = first_committee[position];
        let effective_balance = state.registry.validator(candidate_index)?.effective_balance;

        if effective_balance * MAX_RANDOM_BYTE >= P::MAX_EFFECTIVE_BALANCE * random_byte {
            return Ok(candidate_index);
        }
    }

    Err(Error::FailedToSelectProposer.into())
}

#[must_use]
pub fn get_domain<P: Preset>(
    state: &BeaconState<P>,
    domain_type: DomainType,
    message_epoch: Option<Epoch>,
) -> Domain {
    let epoch = message_epoch.unwrap_or_else(|| get_current_epoch(state));
    let fork = state.fork;

    let fork_version = if epoch < fork.epoch {
        fork.previous_version
    } else {
        fork.current_version
    };

    misc::compute_domain(domain_type, fork_version)
}

/// Committee members whose bits are set in `bitfield`, sorted in ascending order.
///
/// `bitfield` must describe exactly as many bits as the committee has members.
pub fn get_attesting_indices<P: Preset>(
    state: &BeaconState<P>,
    attestation_data: AttestationData,
    bitfield: &Bitfield,
) -> Result<Vec<ValidatorIndex>> {
    let committee = get_crosslink_committee(
        state,
        attestation_data.target_epoch,
        attestation_data.crosslink.shard,
    )?;

    bitfield.validate(committee.len())?;

    committee
        .into_iter()
        .enumerate()
        .filter(|(position, _)| bitfield.has_voted(*position))
        .map(|(_, validator_index)| validator_index)
        .sorted_unstable()
        .collect_vec()
        .pipe(Ok)
}

/// Converts `attestation` to the form whose signature can be checked.
///
/// Custody bit 0 indices are the attesting indices that are not custody bit 1 indices.
pub fn get_indexed_attestation<P: Preset>(
    state: &BeaconState<P>,
    attestation: &Attestation,
) -> Result<IndexedAttestation> {
    let attesting_indices =
        get_attesting_indices(state, attestation.data, &attestation.aggregation_bitfield)?;

    let custody_bit_1_indices =
        get_attesting_indices(state, attestation.data, &attestation.custody_bitfield)?;

    let custody_bit_0_indices = attesting_indices
        .into_iter()
        .filter(|index| custody_bit_1_indices.binary_search(index).is_err())
        .collect();

    Ok(IndexedAttestation {
        custody_bit_0_indices,
        custody_bit_1_indices,
        data: attestation.data,
        signature: attestation.signature,
    })
}

pub fn get_attestation_data_slot<P: Preset>(
    state: &BeaconState<P>,
    attestation_data: AttestationData,
) -> Result<Slot> {
    let shard_count = P::ShardCount::U64;
    let epoch = attestation_data.target_epoch;
    let shard = attestation_data.crosslink.shard;

    ensure!(shard < shard_count, Error::ShardOutOfRange { shard });

    let committee_count = get_epoch_committee_count(state, epoch);
    let offset = (shard + shard_count - get_epoch_start_shard(state, epoch)?) % shard_count;
    let committees_per_slot = committee_count / P::SlotsPerEpoch::U64;

    Ok(misc::compute_start_slot_at_epoch::<P>(epoch) + offset / committees_per_slot)
}

/// Combined effective balance of `indices`. Never less than 1 to avoid dividing by zero.
pub fn get_total_balance<P: Preset>(
    state: &BeaconState<P>,
    indices: impl IntoIterator<Item = ValidatorIndex>,
) -> Result<Gwei> {
    let mut total: Gwei = 0;

    for index in indices {
        total += state.validators().get(index)?.effective_balance;
    }

    Ok(total.max(1))
}

#[must_use]
pub fn get_total_active_balance<P: Preset>(state: &BeaconState<P>) -> Gwei {
    let current_epoch = get_current_epoch(state);

    state
        .validators()
        .into_iter()
        .filter(|validator| predicates::is_active_validator(validator, current_epoch))
        .map(|validator| validator.effective_balance)
        .sum::<Gwei>()
        .max(1)
}

#[must_use]
pub fn get_churn_limit<P: Preset>(config: &Config, state: &BeaconState<P>) -> u64 {
    (active_validator_count(state, get_current_epoch(state)) / config.churn_limit_quotient)
        .max(config.min_per_epoch_churn_limit)
}

pub fn get_base_reward<P: Preset>(state: &BeaconState<P>, index: ValidatorIndex) -> Result<Gwei> {
    let effective_balance = state.validators().get(index)?.effective_balance;
    let total_active_balance = get_total_active_balance(state);

    Ok(misc::compute_base_reward::<P>(
        effective_balance,
        total_active_balance,
    ))
}
