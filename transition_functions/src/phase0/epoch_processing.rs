use anyhow::Result;
use helper_functions::{
    accessors::{
        compute_active_index_root, get_crosslink_committee, get_current_epoch,
        get_epoch_committee_count, get_epoch_start_shard, get_next_epoch, get_previous_epoch,
        get_shard_delta, get_total_active_balance, get_total_balance,
    },
    phase0::{
        get_attesting_balance, get_matching_target_attestations,
        get_winning_crosslink_and_attesting_indices,
    },
};
use log::{debug, info};
use typenum::Unsigned as _;
use types::{
    config::Config,
    phase0::beacon_state::BeaconState,
    preset::Preset,
    Crosslinks,
};

use crate::{
    phase0::epoch_intermediates::{self, EpochDeltasForTransition},
    unphased,
};

pub fn process_epoch<P: Preset>(config: &Config, state: &BeaconState<P>) -> Result<BeaconState<P>> {
    let mut state = state.clone();
    process_epoch_in_place(config, &mut state)?;
    Ok(state)
}

pub(crate) fn process_epoch_in_place<P: Preset>(
    config: &Config,
    state: &mut BeaconState<P>,
) -> Result<()> {
    let epoch = get_current_epoch(state);
    let old_finalized_epoch = state.finalized_epoch;
    let old_crosslinks = state.current_crosslinks.clone();

    justify_and_finalize(state)?;
    state.current_crosslinks = updated_crosslinks(state)?;
    state.previous_crosslinks = old_crosslinks;
    apply_rewards_and_penalties(state)?;
    unphased::update_registry(config, state)?;
    apply_slashing_penalties(state);
    apply_final_updates(state);

    let updated_crosslink_count = state
        .previous_crosslinks
        .iter()
        .zip(state.current_crosslinks.iter())
        .filter(|(old, new)| old != new)
        .count();

    debug!(
        "processed epoch {epoch} (justified: {}, finalized: {}, crosslinks updated: {})",
        state.current_justified_epoch, state.finalized_epoch, updated_crosslink_count,
    );

    if state.finalized_epoch != old_finalized_epoch {
        info!(
            "finalized epoch {} (root: {:?})",
            state.finalized_epoch, state.finalized_root,
        );
    }

    Ok(())
}

pub fn process_justification_and_finalization<P: Preset>(
    state: &BeaconState<P>,
) -> Result<BeaconState<P>> {
    let mut state = state.clone();
    justify_and_finalize(&mut state)?;
    Ok(state)
}

fn justify_and_finalize<P: Preset>(state: &mut BeaconState<P>) -> Result<()> {
    if !unphased::should_process_justification_and_finalization(state) {
        return Ok(());
    }

    let previous_epoch = get_previous_epoch(state);
    let current_epoch = get_current_epoch(state);
    let total_active_balance = get_total_active_balance(state);

    let previous_epoch_target_balance = get_attesting_balance(
        state,
        &get_matching_target_attestations(state, previous_epoch)?,
    )?;

    let current_epoch_target_balance = get_attesting_balance(
        state,
        &get_matching_target_attestations(state, current_epoch)?,
    )?;

    unphased::weigh_justification_and_finalization(
        state,
        total_active_balance,
        previous_epoch_target_balance,
        current_epoch_target_balance,
    )
}

/// Moves `current_crosslinks` into `previous_crosslinks` and stores every winning crosslink
/// backed by two thirds of its committee.
pub fn process_crosslinks<P: Preset>(state: &BeaconState<P>) -> Result<BeaconState<P>> {
    Ok(BeaconState {
        previous_crosslinks: state.current_crosslinks.clone(),
        current_crosslinks: updated_crosslinks(state)?,
        ..state.clone()
    })
}

// Winners are computed against the crosslinks at the start of the epoch.
// A shard that has committees in both epochs keeps the winner of the later one.
fn updated_crosslinks<P: Preset>(state: &BeaconState<P>) -> Result<Crosslinks<P>> {
    let mut crosslinks = state.current_crosslinks.clone();

    for epoch in [get_previous_epoch(state), get_current_epoch(state)] {
        let start_shard = get_epoch_start_shard(state, epoch)?;

        for offset in 0..get_epoch_committee_count(state, epoch) {
            let shard = (start_shard + offset) % P::ShardCount::U64;
            let committee = get_crosslink_committee(state, epoch, shard)?;

            let (winning_crosslink, attesting_indices) =
                get_winning_crosslink_and_attesting_indices(state, epoch, shard)?;

            let attesting_balance = get_total_balance(state, attesting_indices)?;
            let committee_balance = get_total_balance(state, committee)?;

            if 3 * attesting_balance >= 2 * committee_balance {
                *crosslinks.get_mut(shard)? = winning_crosslink;
            }
        }
    }

    Ok(crosslinks)
}

pub fn process_rewards_and_penalties<P: Preset>(state: &BeaconState<P>) -> Result<BeaconState<P>> {
    let mut state = state.clone();
    apply_rewards_and_penalties(&mut state)?;
    Ok(state)
}

fn apply_rewards_and_penalties<P: Preset>(state: &mut BeaconState<P>) -> Result<()> {
    if !unphased::should_process_rewards_and_penalties(state) {
        return Ok(());
    }

    let deltas = epoch_intermediates::epoch_deltas::<P, EpochDeltasForTransition>(state)?;
    unphased::apply_deltas(state, deltas);

    Ok(())
}

pub fn process_registry_updates<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
) -> Result<BeaconState<P>> {
    let mut state = state.clone();
    unphased::update_registry(config, &mut state)?;
    Ok(state)
}

#[must_use]
pub fn process_slashings<P: Preset>(state: &BeaconState<P>) -> BeaconState<P> {
    let mut state = state.clone();
    apply_slashing_penalties(&mut state);
    state
}

fn apply_slashing_penalties<P: Preset>(state: &mut BeaconState<P>) {
    let current_epoch = get_current_epoch(state);
    let total_balance = get_total_active_balance(state);

    // > Compute slashed balances in the current epoch
    let total_at_start = *state.slashed_balances.mod_index(current_epoch + 1);
    let total_at_end = *state.slashed_balances.mod_index(current_epoch);
    let total_penalties = total_at_end.saturating_sub(total_at_start);

    let slashing_period = P::EpochsPerSlashedBalancesVector::U64 / 2;

    // > Collective penalty is the whole effective balance once a third of the stake is slashed
    let collective_penalty_applies = total_penalties.saturating_mul(3) >= total_balance;

    // > Compute slashing penalties
    for (validator, balance) in state.registry.iter_mut() {
        if validator.slashed && current_epoch + slashing_period == validator.withdrawable_epoch {
            let effective_balance = validator.effective_balance;
            let minimum_penalty = effective_balance / P::MIN_SLASHING_PENALTY_QUOTIENT;

            let penalty = if collective_penalty_applies {
                effective_balance
            } else {
                minimum_penalty
            };

            *balance = balance.saturating_sub(penalty);
        }
    }
}

#[must_use]
pub fn process_final_updates<P: Preset>(state: &BeaconState<P>) -> BeaconState<P> {
    let mut state = state.clone();
    apply_final_updates(&mut state);
    state
}

fn apply_final_updates<P: Preset>(state: &mut BeaconState<P>) {
    let current_epoch = get_current_epoch(state);
    let next_epoch = get_next_epoch(state);

    unphased::reset_eth1_data_votes(state);
    unphased::update_effective_balances(state);

    // > Update start shard
    state.start_shard =
        (state.start_shard + get_shard_delta(state, current_epoch)) % P::ShardCount::U64;

    // > Set active index root
    let index_epoch = next_epoch + P::ACTIVATION_EXIT_DELAY;
    *state.active_index_roots.mod_index_mut(index_epoch) =
        compute_active_index_root(state, index_epoch);

    // > Set total slashed balances
    *state.slashed_balances.mod_index_mut(next_epoch) =
        *state.slashed_balances.mod_index(current_epoch);

    unphased::update_randao_mixes(state);
    unphased::update_historical_roots(state);

    // > Rotate current/previous epoch attestations
    state.previous_epoch_attestations = core::mem::take(&mut state.current_epoch_attestations);
}
