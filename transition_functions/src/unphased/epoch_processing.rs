use anyhow::Result;
use arithmetic::{NonZeroExt as _, U64Ext as _};
use helper_functions::{
    accessors::{
        get_block_root, get_churn_limit, get_current_epoch, get_next_epoch, get_previous_epoch,
        get_randao_mix,
    },
    misc::compute_activation_exit_epoch,
    mutators::initiate_validator_exit,
    predicates::{is_active_validator, is_eligible_for_activation_queue},
};
use itertools::Itertools as _;
use ssz::{PersistentList, SszHash as _};
use typenum::Unsigned as _;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        consts::{FAR_FUTURE_EPOCH, GENESIS_EPOCH},
        containers::HistoricalBatch,
        primitives::Gwei,
    },
    preset::Preset,
};

use crate::unphased::EpochDeltas;

pub fn should_process_justification_and_finalization<P: Preset>(state: &BeaconState<P>) -> bool {
    // > Skip FFG updates in the first two epochs to avoid corner cases
    // > that might result in modifying the genesis stub roots.
    GENESIS_EPOCH + 1 < get_current_epoch(state)
}

pub fn should_process_rewards_and_penalties<P: Preset>(state: &BeaconState<P>) -> bool {
    // > No rewards are applied at the end of `GENESIS_EPOCH`
    // > because rewards are for work done in the previous epoch
    GENESIS_EPOCH < get_current_epoch(state)
}

pub(crate) fn weigh_justification_and_finalization<P: Preset>(
    state: &mut BeaconState<P>,
    total_active_balance: Gwei,
    previous_epoch_target_balance: Gwei,
    current_epoch_target_balance: Gwei,
) -> Result<()> {
    let current_epoch = get_current_epoch(state);
    let previous_epoch = get_previous_epoch(state);
    let old_previous_justified_epoch = state.previous_justified_epoch;
    let old_current_justified_epoch = state.current_justified_epoch;

    // > Process justifications
    state.previous_justified_epoch = state.current_justified_epoch;
    state.previous_justified_root = state.current_justified_root;
    state.justification_bitfield <<= 1;

    for (epoch, bit, target_balance) in [
        (previous_epoch, 1, previous_epoch_target_balance),
        (current_epoch, 0, current_epoch_target_balance),
    ] {
        if target_balance * 3 >= total_active_balance * 2 {
            state.current_justified_epoch = epoch;
            state.current_justified_root = get_block_root(state, epoch)?;
            state.justification_bitfield |= 1 << bit;
        }
    }

    // > Process finalizations
    let bitfield = state.justification_bitfield;
    let matches = |offset: u32, modulus: u64, pattern: u64| (bitfield >> offset) % modulus == pattern;
    let mut finalized_epoch = state.finalized_epoch;

    // > The 2nd/3rd/4th most recent epochs are justified, the 2nd using the 4th as source
    if matches(1, 8, 0b111) && old_previous_justified_epoch + 3 == current_epoch {
        finalized_epoch = old_previous_justified_epoch;
    }

    // > The 2nd/3rd most recent epochs are justified, the 2nd using the 3rd as source
    if matches(1, 4, 0b11) && old_previous_justified_epoch + 2 == current_epoch {
        finalized_epoch = old_previous_justified_epoch;
    }

    // > The 1st/2nd/3rd most recent epochs are justified, the 1st using the 3rd as source
    if matches(0, 8, 0b111) && old_current_justified_epoch + 2 == current_epoch {
        finalized_epoch = old_current_justified_epoch;
    }

    // > The 1st/2nd most recent epochs are justified, the 1st using the 2nd as source
    if matches(0, 4, 0b11) && old_current_justified_epoch + 1 == current_epoch {
        finalized_epoch = old_current_justified_epoch;
    }

    if finalized_epoch != state.finalized_epoch {
        state.finalized_epoch = finalized_epoch;
        state.finalized_root = get_block_root(state, finalized_epoch)?;
    }

    Ok(())
}

pub(crate) fn apply_deltas<P: Preset>(
    state: &mut BeaconState<P>,
    deltas: impl IntoIterator<Item = impl EpochDeltas>,
) {
    for ((_, balance), deltas) in state.registry.iter_mut().zip(deltas) {
        *balance += deltas.combined_reward();
        *balance = balance.saturating_sub(deltas.combined_penalty());
    }
}

pub(crate) fn update_registry<P: Preset>(config: &Config, state: &mut BeaconState<P>) -> Result<()> {
    let current_epoch = get_current_epoch(state);
    let mut ejections = vec![];

    // > Process activation eligibility and ejections
    for ((validator, _), index) in state.registry.iter_mut().zip(0..) {
        if is_eligible_for_activation_queue::<P>(validator) {
            validator.activation_eligibility_epoch = current_epoch;
        }

        if is_active_validator(validator, current_epoch)
            && validator.effective_balance <= config.ejection_balance
        {
            ejections.push(index);
        }
    }

    // Each exit sees the exits queued before it.
    for index in ejections {
        *state = initiate_validator_exit(config, state, index)?;
    }

    // > Queue validators eligible for activation and not yet dequeued for activation
    let finalized_activation_epoch = compute_activation_exit_epoch::<P>(state.finalized_epoch);

    let activation_queue = (0..)
        .zip(state.validators())
        .filter(|(_, validator)| {
            validator.activation_eligibility_epoch != FAR_FUTURE_EPOCH
                && validator.activation_epoch >= finalized_activation_epoch
        })
        // > Order by the sequence of activation_eligibility_epoch setting and then index
        .map(|(index, validator)| (validator.activation_eligibility_epoch, index))
        .sorted_unstable()
        .map(|(_, index)| index)
        .collect_vec();

    // > Dequeued validators for activation up to churn limit (without resetting activation epoch)
    let churn_limit = get_churn_limit(config, state).try_into()?;
    let activation_epoch = compute_activation_exit_epoch::<P>(current_epoch);

    for index in activation_queue.into_iter().take(churn_limit) {
        let validator = state.registry.validator_mut(index)?;

        if validator.activation_epoch == FAR_FUTURE_EPOCH {
            validator.activation_epoch = activation_epoch;
        }
    }

    Ok(())
}

pub(crate) fn reset_eth1_data_votes<P: Preset>(state: &mut BeaconState<P>) {
    // > Reset eth1 data votes
    if (state.slot + 1).is_multiple_of_nonzero(P::SlotsPerEth1VotingPeriod::non_zero()) {
        state.eth1_data_votes = PersistentList::default();
    }
}

pub(crate) fn update_effective_balances<P: Preset>(state: &mut BeaconState<P>) {
    let half_increment = P::EFFECTIVE_BALANCE_INCREMENT.get() / 2;

    // > Update effective balances with hysteresis
    for (validator, balance) in state.registry.iter_mut() {
        let balance = *balance;

        if balance < validator.effective_balance
            || validator.effective_balance + 3 * half_increment < balance
        {
            validator.effective_balance = balance
                .prev_multiple_of(P::EFFECTIVE_BALANCE_INCREMENT)
                .min(P::MAX_EFFECTIVE_BALANCE);
        }
    }
}

pub(crate) fn update_randao_mixes<P: Preset>(state: &mut BeaconState<P>) {
    let current_epoch = get_current_epoch(state);
    let next_epoch = get_next_epoch(state);

    // > Set randao mix
    *state.randao_mixes.mod_index_mut(next_epoch) = get_randao_mix(state, current_epoch);
}

pub(crate) fn update_historical_roots<P: Preset>(state: &mut BeaconState<P>) {
    let next_epoch = get_next_epoch(state);
    let epochs_per_historical_root = P::SlotsPerHistoricalRoot::U64 / P::SlotsPerEpoch::U64;

    // > Set historical root accumulator
    if next_epoch % epochs_per_historical_root == 0 {
        let historical_batch = HistoricalBatch::<P> {
            block_roots: state.block_roots.clone(),
            state_roots: state.state_roots.clone(),
        };

        state.historical_roots.push(historical_batch.hash_tree_root());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use test_case::test_case;
    use types::{
        phase0::{
            containers::Validator,
            primitives::{Epoch, H256},
        },
        preset::Minimal,
    };

    use super::*;

    fn active_validator(effective_balance: Gwei) -> Validator {
        Validator {
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
            effective_balance,
            ..Validator::default()
        }
    }

    fn state_at_end_of_epoch(epoch: Epoch, validators: &[(Validator, Gwei)]) -> BeaconState<Minimal> {
        let mut state = BeaconState::<Minimal> {
            slot: (epoch + 1) * 8 - 1,
            ..BeaconState::default()
        };

        for (validator, balance) in validators {
            state.registry.push(*validator, *balance);
        }

        for (root, byte) in state.block_roots.iter_mut().zip(1..) {
            *root = H256::repeat_byte(byte);
        }

        state
    }

    #[test_case(32_000_000_000, 31_999_999_999 => 31_000_000_000; "any decrease is applied")]
    #[test_case(31_000_000_000, 32_499_999_999 => 31_000_000_000; "small increase is ignored")]
    #[test_case(31_000_000_000, 32_500_000_001 => 32_000_000_000; "large increase is applied")]
    #[test_case(32_000_000_000, 40_000_000_000 => 32_000_000_000; "capped at maximum")]
    #[test_case(17_000_000_000, 0 => 0)]
    fn effective_balance_hysteresis(effective_balance: Gwei, balance: Gwei) -> Gwei {
        let mut state = state_at_end_of_epoch(0, &[(active_validator(effective_balance), balance)]);

        update_effective_balances(&mut state);

        state.validators().get(0).expect("validator 0 exists").effective_balance
    }

    #[test]
    fn two_justified_epochs_finalize_the_older_one() -> Result<()> {
        let mut state = state_at_end_of_epoch(3, &[]);

        state.previous_justified_epoch = 1;
        state.current_justified_epoch = 2;
        state.justification_bitfield = 0b1;

        weigh_justification_and_finalization(&mut state, 100, 0, 67)?;

        assert_eq!(state.previous_justified_epoch, 2);
        assert_eq!(state.current_justified_epoch, 3);
        assert_eq!(state.current_justified_root, get_block_root(&state, 3)?);
        assert_eq!(state.justification_bitfield, 0b11);
        assert_eq!(state.finalized_epoch, 2);
        assert_eq!(state.finalized_root, get_block_root(&state, 2)?);

        Ok(())
    }

    #[test]
    fn insufficient_support_justifies_nothing() -> Result<()> {
        let mut state = state_at_end_of_epoch(3, &[]);

        state.current_justified_epoch = 2;
        state.current_justified_root = H256::repeat_byte(0xaa);
        state.justification_bitfield = 0b1;

        weigh_justification_and_finalization(&mut state, 100, 66, 66)?;

        assert_eq!(state.current_justified_epoch, 2);
        assert_eq!(state.previous_justified_root, H256::repeat_byte(0xaa));
        assert_eq!(state.justification_bitfield, 0b10);
        assert_eq!(state.finalized_epoch, 0);
        assert_eq!(state.finalized_root, H256::zero());

        Ok(())
    }

    #[test]
    fn registry_updates_eject_and_activate() -> Result<()> {
        let config = Config::minimal();

        let pending = Validator {
            effective_balance: Minimal::MAX_EFFECTIVE_BALANCE,
            ..Validator::create_pending_validator::<Minimal>(
                bls::EMPTY_PUBKEY,
                H256::zero(),
                Minimal::MAX_EFFECTIVE_BALANCE,
            )
        };

        let queued = Validator {
            activation_eligibility_epoch: 0,
            ..pending
        };

        let mut state = state_at_end_of_epoch(
            2,
            &[
                (active_validator(Minimal::MAX_EFFECTIVE_BALANCE), 0),
                (active_validator(config.ejection_balance), 0),
                (pending, 0),
                (queued, 0),
            ],
        );

        update_registry(&config, &mut state)?;

        let validators = state.validators().into_iter().copied().collect_vec();

        assert_eq!(validators[0].exit_epoch, FAR_FUTURE_EPOCH);
        assert_eq!(validators[1].exit_epoch, compute_activation_exit_epoch::<Minimal>(2));
        assert_eq!(validators[2].activation_eligibility_epoch, 2);
        assert_eq!(validators[2].activation_epoch, compute_activation_exit_epoch::<Minimal>(2));
        assert_eq!(validators[3].activation_epoch, compute_activation_exit_epoch::<Minimal>(2));

        Ok(())
    }

    #[test]
    fn activation_queue_is_limited_by_churn() -> Result<()> {
        let config = Config::minimal();

        let queued = Validator {
            activation_eligibility_epoch: 0,
            ..Validator::create_pending_validator::<Minimal>(
                bls::EMPTY_PUBKEY,
                H256::zero(),
                Minimal::MAX_EFFECTIVE_BALANCE,
            )
        };

        let validators = vec![(queued, 0); 6];
        let mut state = state_at_end_of_epoch(0, &validators);

        state.registry.validator_mut(5)?.activation_eligibility_epoch = FAR_FUTURE_EPOCH - 1;
        state.registry.validator_mut(0)?.activation_eligibility_epoch = 1;

        update_registry(&config, &mut state)?;

        let activated = (0..)
            .zip(state.validators())
            .filter(|(_, validator)| validator.activation_epoch != FAR_FUTURE_EPOCH)
            .map(|(index, _)| index)
            .collect::<HashSet<u64>>();

        assert_eq!(activated, HashSet::from([1, 2, 3, 4]));

        Ok(())
    }

    #[test]
    fn eth1_votes_are_reset_at_period_boundary() {
        let mut state = state_at_end_of_epoch(1, &[]);

        state.eth1_data_votes.push(Default::default());
        reset_eth1_data_votes(&mut state);

        assert!(state.eth1_data_votes.is_empty());

        let mut state = state_at_end_of_epoch(0, &[]);

        state.eth1_data_votes.push(Default::default());
        reset_eth1_data_votes(&mut state);

        assert_eq!(state.eth1_data_votes.len(), 1);
    }

    #[test]
    fn historical_root_is_appended_every_eight_epochs() {
        let mut state = state_at_end_of_epoch(6, &[]);

        update_historical_roots(&mut state);
        assert!(state.historical_roots.is_empty());

        let mut state = state_at_end_of_epoch(7, &[]);

        update_historical_roots(&mut state);
        assert_eq!(state.historical_roots.len(), 1);
    }

    #[test]
    fn randao_mix_is_carried_forward() {
        let mut state = state_at_end_of_epoch(2, &[]);

        *state.randao_mixes.mod_index_mut(2) = H256::repeat_byte(5);
        update_randao_mixes(&mut state);

        assert_eq!(*state.randao_mixes.mod_index(3), H256::repeat_byte(5));
    }
}
