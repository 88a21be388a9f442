//! Operations that produce a new state with one validator changed.
//!
//! The input state is never modified. The returned state shares all untouched data with it.

use core::cmp::Ordering;

use anyhow::Result;
use typenum::Unsigned as _;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        consts::FAR_FUTURE_EPOCH,
        containers::Validator,
        primitives::{Epoch, Gwei, ValidatorIndex},
    },
    preset::Preset,
};

use crate::{
    accessors::{get_beacon_proposer_index, get_churn_limit, get_current_epoch},
    error::Error,
    misc::compute_activation_exit_epoch,
};

pub fn increase_balance<P: Preset>(
    state: &BeaconState<P>,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<BeaconState<P>> {
    let registry = state.registry.update_balance(index, |balance| balance + delta)?;

    Ok(BeaconState {
        registry,
        ..state.clone()
    })
}

/// Like [`increase_balance`], but the balance stops at zero.
pub fn decrease_balance<P: Preset>(
    state: &BeaconState<P>,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<BeaconState<P>> {
    let registry = state
        .registry
        .update_balance(index, |balance| balance.saturating_sub(delta))?;

    Ok(BeaconState {
        registry,
        ..state.clone()
    })
}

#[must_use]
pub const fn activate_validator(validator: Validator, activation_epoch: Epoch) -> Validator {
    Validator {
        activation_eligibility_epoch: activation_epoch,
        activation_epoch,
        ..validator
    }
}

pub fn initiate_validator_exit<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    index: ValidatorIndex,
) -> Result<BeaconState<P>> {
    // > Return if validator already initiated exit
    if state.registry.validator(index)?.exit_epoch != FAR_FUTURE_EPOCH {
        return Ok(state.clone());
    }

    // > Compute exit queue epoch
    let mut exit_queue_epoch = compute_activation_exit_epoch::<P>(get_current_epoch(state));
    let mut exit_queue_churn = 0;

    for validator in state.validators() {
        let exit_epoch = validator.exit_epoch;

        if exit_epoch == FAR_FUTURE_EPOCH {
            continue;
        }

        match exit_epoch.cmp(&exit_queue_epoch) {
            Ordering::Less => {}
            Ordering::Equal => exit_queue_churn += 1,
            Ordering::Greater => {
                exit_queue_epoch = exit_epoch;
                exit_queue_churn = 1;
            }
        }
    }

    if exit_queue_churn >= get_churn_limit(config, state) {
        exit_queue_epoch += 1;
    }

    // > Set validator exit epoch and withdrawable epoch
    let withdrawable_epoch = exit_queue_epoch
        .checked_add(config.min_validator_withdrawability_delay)
        .ok_or(Error::EpochOverflow)?;

    let registry = state.registry.update_validator(index, |validator| Validator {
        exit_epoch: exit_queue_epoch,
        withdrawable_epoch,
        ..*validator
    })?;

    Ok(BeaconState {
        registry,
        ..state.clone()
    })
}

/// Exits and slashes the validator at `index`.
///
/// The whistleblowing reward is split between the proposer and `whistleblower_index`,
/// which defaults to the proposer.
pub fn slash_validator<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    slashed_index: ValidatorIndex,
    whistleblower_index: Option<ValidatorIndex>,
) -> Result<BeaconState<P>> {
    let current_epoch = get_current_epoch(state);
    let mut state = initiate_validator_exit(config, state, slashed_index)?;

    let validator = state.registry.validator_mut(slashed_index)?;
    let effective_balance = validator.effective_balance;

    validator.slashed = true;
    validator.withdrawable_epoch = current_epoch + P::EpochsPerSlashedBalancesVector::U64;

    *state.slashed_balances.mod_index_mut(current_epoch) += effective_balance;

    let proposer_index = get_beacon_proposer_index(&state)?;
    let whistleblower_index = whistleblower_index.unwrap_or(proposer_index);
    let whistleblowing_reward = effective_balance / P::WHISTLEBLOWING_REWARD_QUOTIENT;
    let proposer_reward = whistleblowing_reward / P::PROPOSER_REWARD_QUOTIENT;

    let state = increase_balance(&state, proposer_index, proposer_reward)?;
    let state = increase_balance(
        &state,
        whistleblower_index,
        whistleblowing_reward - proposer_reward,
    )?;

    decrease_balance(&state, slashed_index, whistleblowing_reward)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use types::preset::Minimal;

    use crate::fixtures;

    use super::*;

    #[test_case(10, 3 => 7)]
    #[test_case(10, 10 => 0)]
    #[test_case(10, 11 => 0; "saturates at zero")]
    #[test_case(0, u64::MAX => 0)]
    fn decrease_balance_never_goes_negative(balance: Gwei, delta: Gwei) -> Gwei {
        let mut state = fixtures::state_with_validators::<Minimal>(1, 0);
        *state.registry.balance_mut(0).expect("validator 0 exists") = balance;

        decrease_balance(&state, 0, delta)
            .and_then(|state| Ok(state.registry.balance(0)?))
            .expect("validator 0 exists")
    }

    #[test]
    fn balance_updates_leave_input_untouched() -> Result<()> {
        let state = fixtures::state_with_validators::<Minimal>(2, 0);
        let increased = increase_balance(&state, 1, 5)?;

        assert_eq!(state.registry.balance(1)?, Minimal::MAX_EFFECTIVE_BALANCE);
        assert_eq!(increased.registry.balance(1)?, Minimal::MAX_EFFECTIVE_BALANCE + 5);
        assert_eq!(increased.registry.balance(0)?, Minimal::MAX_EFFECTIVE_BALANCE);

        Ok(())
    }

    #[test]
    fn balance_updates_reject_unknown_index() {
        let state = fixtures::state_with_validators::<Minimal>(2, 0);

        for result in [increase_balance(&state, 2, 1), decrease_balance(&state, 2, 1)] {
            let error = result.expect_err("validator 2 does not exist");

            assert_eq!(
                error.downcast_ref::<ssz::Error>(),
                Some(&ssz::Error::IndexOutOfBounds {
                    index: 2,
                    length: 2,
                }),
            );
        }
    }

    #[test]
    fn exits_respect_churn_limit() -> Result<()> {
        let config = Config::minimal();
        let mut state = fixtures::state_with_validators::<Minimal>(32, 0);

        for index in 0..5 {
            state = initiate_validator_exit(&config, &state, index)?;
        }

        let exit_epochs = (0..6)
            .map(|index| Ok(state.registry.validator(index)?.exit_epoch))
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(exit_epochs, [5, 5, 5, 5, 6, FAR_FUTURE_EPOCH]);
        assert_eq!(
            state.registry.validator(4)?.withdrawable_epoch,
            6 + config.min_validator_withdrawability_delay,
        );

        let again = initiate_validator_exit(&config, &state, 4)?;

        assert_eq!(again, state);

        Ok(())
    }

    #[test]
    fn slashing_rewards_proposer() -> Result<()> {
        let config = Config::minimal();
        let state = fixtures::state_with_validators::<Minimal>(32, 0);
        let proposer_index = get_beacon_proposer_index(&state)?;
        let slashed_index = (proposer_index + 1) % 32;

        let slashed_state = slash_validator(&config, &state, slashed_index, None)?;
        let validator = slashed_state.registry.validator(slashed_index)?;
        let whistleblowing_reward = Minimal::MAX_EFFECTIVE_BALANCE / 512;

        assert!(validator.slashed);
        assert_eq!(validator.exit_epoch, 5);
        assert_eq!(validator.withdrawable_epoch, 64);
        assert_eq!(
            *slashed_state.slashed_balances.mod_index(0),
            Minimal::MAX_EFFECTIVE_BALANCE,
        );
        assert_eq!(
            slashed_state.registry.balance(slashed_index)?,
            Minimal::MAX_EFFECTIVE_BALANCE - whistleblowing_reward,
        );
        assert_eq!(
            slashed_state.registry.balance(proposer_index)?,
            Minimal::MAX_EFFECTIVE_BALANCE + whistleblowing_reward,
        );
        assert!(!state.registry.validator(slashed_index)?.slashed);

        Ok(())
    }

    #[test]
    fn activation_sets_both_epochs() {
        let validator = activate_validator(Validator::default(), 3);

        assert_eq!(validator.activation_eligibility_epoch, 3);
        assert_eq!(validator.activation_epoch, 3);
    }
}
