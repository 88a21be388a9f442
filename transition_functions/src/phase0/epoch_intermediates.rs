use core::num::NonZeroU64;

use anyhow::Result;
use helper_functions::{
    accessors::{
        get_attesting_indices, get_crosslink_committee, get_epoch_committee_count,
        get_epoch_start_shard, get_finality_delay, get_previous_epoch, get_total_active_balance,
        get_total_balance,
    },
    misc::compute_base_reward,
    phase0::{
        get_matching_head_attestations, get_matching_source_attestations,
        get_matching_target_attestations, get_unslashed_attesting_indices,
        get_winning_crosslink_and_attesting_indices,
    },
    predicates::is_eligible_for_penalties,
};
use itertools::Itertools as _;
use typenum::Unsigned as _;
use types::{
    phase0::{
        beacon_state::BeaconState,
        consts::BASE_REWARDS_PER_EPOCH,
        containers::PendingAttestation,
        primitives::{Gwei, ValidatorIndex},
    },
    preset::Preset,
};

use crate::unphased::{EpochDeltas, Error};

pub trait Phase0EpochDeltas: Copy + Default {
    fn add_source_reward(&mut self, value: Gwei);
    fn add_source_penalty(&mut self, value: Gwei);
    fn add_target_reward(&mut self, value: Gwei);
    fn add_target_penalty(&mut self, value: Gwei);
    fn add_head_reward(&mut self, value: Gwei);
    fn add_head_penalty(&mut self, value: Gwei);
    fn add_proposer_reward(&mut self, value: Gwei);
    fn add_inclusion_delay_reward(&mut self, value: Gwei);
    fn add_inactivity_penalty(&mut self, value: Gwei);
    fn add_crosslink_reward(&mut self, value: Gwei);
    fn add_crosslink_penalty(&mut self, value: Gwei);
}

#[derive(Clone, Copy, Default)]
pub struct EpochDeltasForTransition {
    reward: Gwei,
    penalty: Gwei,
}

impl EpochDeltas for EpochDeltasForTransition {
    fn combined_reward(self) -> Gwei {
        self.reward
    }

    fn combined_penalty(self) -> Gwei {
        self.penalty
    }
}

impl Phase0EpochDeltas for EpochDeltasForTransition {
    fn add_source_reward(&mut self, value: Gwei) {
        self.reward += value;
    }

    fn add_source_penalty(&mut self, value: Gwei) {
        self.penalty += value;
    }

    fn add_target_reward(&mut self, value: Gwei) {
        self.reward += value;
    }

    fn add_target_penalty(&mut self, value: Gwei) {
        self.penalty += value;
    }

    fn add_head_reward(&mut self, value: Gwei) {
        self.reward += value;
    }

    fn add_head_penalty(&mut self, value: Gwei) {
        self.penalty += value;
    }

    fn add_proposer_reward(&mut self, value: Gwei) {
        self.reward += value;
    }

    fn add_inclusion_delay_reward(&mut self, value: Gwei) {
        self.reward += value;
    }

    fn add_inactivity_penalty(&mut self, value: Gwei) {
        self.penalty += value;
    }

    fn add_crosslink_reward(&mut self, value: Gwei) {
        self.reward += value;
    }

    fn add_crosslink_penalty(&mut self, value: Gwei) {
        self.penalty += value;
    }
}

/// Deltas broken down by the duty they were earned for.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct EpochDeltasForReport {
    pub source_reward: Gwei,
    pub source_penalty: Gwei,
    pub target_reward: Gwei,
    pub target_penalty: Gwei,
    pub head_reward: Gwei,
    pub head_penalty: Gwei,
    pub proposer_reward: Gwei,
    pub inclusion_delay_reward: Gwei,
    pub inactivity_penalty: Gwei,
    pub crosslink_reward: Gwei,
    pub crosslink_penalty: Gwei,
}

impl EpochDeltas for EpochDeltasForReport {
    fn combined_reward(self) -> Gwei {
        self.source_reward
            + self.target_reward
            + self.head_reward
            + self.proposer_reward
            + self.inclusion_delay_reward
            + self.crosslink_reward
    }

    fn combined_penalty(self) -> Gwei {
        self.source_penalty
            + self.target_penalty
            + self.head_penalty
            + self.inactivity_penalty
            + self.crosslink_penalty
    }
}

impl Phase0EpochDeltas for EpochDeltasForReport {
    fn add_source_reward(&mut self, value: Gwei) {
        self.source_reward += value;
    }

    fn add_source_penalty(&mut self, value: Gwei) {
        self.source_penalty += value;
    }

    fn add_target_reward(&mut self, value: Gwei) {
        self.target_reward += value;
    }

    fn add_target_penalty(&mut self, value: Gwei) {
        self.target_penalty += value;
    }

    fn add_head_reward(&mut self, value: Gwei) {
        self.head_reward += value;
    }

    fn add_head_penalty(&mut self, value: Gwei) {
        self.head_penalty += value;
    }

    fn add_proposer_reward(&mut self, value: Gwei) {
        self.proposer_reward += value;
    }

    fn add_inclusion_delay_reward(&mut self, value: Gwei) {
        self.inclusion_delay_reward += value;
    }

    fn add_inactivity_penalty(&mut self, value: Gwei) {
        self.inactivity_penalty += value;
    }

    fn add_crosslink_reward(&mut self, value: Gwei) {
        self.crosslink_reward += value;
    }

    fn add_crosslink_penalty(&mut self, value: Gwei) {
        self.crosslink_penalty += value;
    }
}

type DeltaFn<D> = fn(&mut D, Gwei);

/// Rewards and penalties for the previous epoch, one entry per validator.
pub fn epoch_deltas<P: Preset, D: Phase0EpochDeltas>(state: &BeaconState<P>) -> Result<Vec<D>> {
    let mut deltas = vec![D::default(); state.registry.len()];
    let base_rewards = base_rewards(state);

    attestation_deltas(state, &base_rewards, &mut deltas)?;
    crosslink_deltas(state, &base_rewards, &mut deltas)?;

    Ok(deltas)
}

fn base_rewards<P: Preset>(state: &BeaconState<P>) -> Vec<Gwei> {
    let total_active_balance = get_total_active_balance(state);

    state
        .validators()
        .into_iter()
        .map(|validator| compute_base_reward::<P>(validator.effective_balance, total_active_balance))
        .collect()
}

fn attestation_deltas<P: Preset, D: Phase0EpochDeltas>(
    state: &BeaconState<P>,
    base_rewards: &[Gwei],
    deltas: &mut [D],
) -> Result<()> {
    let previous_epoch = get_previous_epoch(state);
    let total_balance = get_total_active_balance(state);

    let eligible_indices = (0..)
        .zip(state.validators())
        .filter(|(_, validator)| is_eligible_for_penalties(validator, previous_epoch))
        .map(|(index, _)| index)
        .collect_vec();

    let source_attestations = get_matching_source_attestations(state, previous_epoch)?;
    let target_attestations = get_matching_target_attestations(state, previous_epoch)?;
    let head_attestations = get_matching_head_attestations(state, previous_epoch)?;

    let source_indices = get_unslashed_attesting_indices(state, source_attestations)?;
    let target_indices = get_unslashed_attesting_indices(state, &target_attestations)?;
    let head_indices = get_unslashed_attesting_indices(state, &head_attestations)?;

    let components: [(&[ValidatorIndex], DeltaFn<D>, DeltaFn<D>); 3] = [
        (&source_indices, D::add_source_reward, D::add_source_penalty),
        (&target_indices, D::add_target_reward, D::add_target_penalty),
        (&head_indices, D::add_head_reward, D::add_head_penalty),
    ];

    // > Micro-incentives for matching FFG source, FFG target, and head
    for (attesting_indices, add_reward, add_penalty) in components {
        let attesting_balance = get_total_balance(state, attesting_indices.iter().copied())?;

        for &index in &eligible_indices {
            let position = usize::try_from(index)?;
            let base_reward = base_rewards[position];

            if attesting_indices.binary_search(&index).is_ok() {
                let reward = proportion(base_reward, attesting_balance, total_balance)?;
                add_reward(&mut deltas[position], reward);
            } else {
                add_penalty(&mut deltas[position], base_reward);
            }
        }
    }

    // > Proposer and inclusion delay micro-rewards
    let mut earliest_inclusions = vec![None::<&PendingAttestation>; deltas.len()];

    for attestation in source_attestations {
        let attesting_indices =
            get_attesting_indices(state, attestation.data, &attestation.aggregation_bitfield)?;

        for index in attesting_indices {
            let earliest = &mut earliest_inclusions[usize::try_from(index)?];

            if earliest.is_none_or(|current| attestation.inclusion_delay < current.inclusion_delay) {
                *earliest = Some(attestation);
            }
        }
    }

    for index in source_indices {
        let position = usize::try_from(index)?;

        let Some(attestation) = earliest_inclusions[position] else {
            continue;
        };

        let base_reward = base_rewards[position];
        let proposer_reward = base_reward / P::PROPOSER_REWARD_QUOTIENT;
        let max_attester_reward = base_reward - proposer_reward;

        let inclusion_delay_reward = NonZeroU64::new(attestation.inclusion_delay)
            .map_or(0, |delay| {
                max_attester_reward * P::MIN_ATTESTATION_INCLUSION_DELAY.get() / delay
            });

        let proposer_index = attestation.proposer_index;

        usize::try_from(proposer_index)
            .ok()
            .and_then(|proposer_position| deltas.get_mut(proposer_position))
            .ok_or(Error::ProposerIndexOutOfBounds { proposer_index })?
            .add_proposer_reward(proposer_reward);

        deltas[position].add_inclusion_delay_reward(inclusion_delay_reward);
    }

    // > Inactivity penalty
    let finality_delay = get_finality_delay(state);

    if finality_delay > P::MIN_EPOCHS_TO_INACTIVITY_PENALTY {
        for index in eligible_indices {
            let position = usize::try_from(index)?;
            let base_reward = base_rewards[position];

            deltas[position].add_inactivity_penalty(BASE_REWARDS_PER_EPOCH.get() * base_reward);

            if target_indices.binary_search(&index).is_err() {
                let effective_balance = state.validators().get(index)?.effective_balance;

                deltas[position].add_inactivity_penalty(
                    effective_balance * finality_delay / P::INACTIVITY_PENALTY_QUOTIENT,
                );
            }
        }
    }

    Ok(())
}

fn crosslink_deltas<P: Preset, D: Phase0EpochDeltas>(
    state: &BeaconState<P>,
    base_rewards: &[Gwei],
    deltas: &mut [D],
) -> Result<()> {
    let epoch = get_previous_epoch(state);
    let start_shard = get_epoch_start_shard(state, epoch)?;

    for offset in 0..get_epoch_committee_count(state, epoch) {
        let shard = (start_shard + offset) % P::ShardCount::U64;
        let committee = get_crosslink_committee(state, epoch, shard)?;
        let (_, attesting_indices) = get_winning_crosslink_and_attesting_indices(state, epoch, shard)?;

        let attesting_balance = get_total_balance(state, attesting_indices.iter().copied())?;
        let committee_balance = get_total_balance(state, committee.iter().copied())?;

        for index in committee {
            let position = usize::try_from(index)?;
            let base_reward = base_rewards[position];

            if attesting_indices.binary_search(&index).is_ok() {
                let reward = proportion(base_reward, attesting_balance, committee_balance)?;
                deltas[position].add_crosslink_reward(reward);
            } else {
                deltas[position].add_crosslink_penalty(base_reward);
            }
        }
    }

    Ok(())
}

// The product of a reward and a total balance can exceed `u64::MAX`.
fn proportion(value: Gwei, numerator: Gwei, denominator: Gwei) -> Result<Gwei> {
    let result = u128::from(value) * u128::from(numerator) / u128::from(denominator.max(1));
    Ok(result.try_into()?)
}
