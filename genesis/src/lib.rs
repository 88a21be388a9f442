use anyhow::{ensure, Result};
use arithmetic::U64Ext as _;
use bls::PublicKeyBytes;
use helper_functions::{
    accessors::{compute_active_index_root, get_active_validator_indices},
    mutators::activate_validator,
};
use ssz::{PersistentVector, SszHash as _};
use thiserror::Error;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        consts::{GENESIS_EPOCH, GENESIS_SLOT},
        containers::{BeaconBlockHeader, Fork, Validator},
        primitives::{Gwei, UnixSeconds, ValidatorIndex, H256},
    },
    preset::Preset,
};

/// Builds a genesis state one deposit at a time.
pub struct Incremental<'config, P: Preset> {
    config: &'config Config,
    beacon_state: BeaconState<P>,
}

impl<'config, P: Preset> Incremental<'config, P> {
    #[must_use]
    pub fn new(config: &'config Config) -> Self {
        let version = config.genesis_fork_version;

        let fork = Fork {
            previous_version: version,
            current_version: version,
            epoch: GENESIS_EPOCH,
        };

        let beacon_state = BeaconState {
            slot: GENESIS_SLOT,
            fork,
            ..BeaconState::default()
        };

        Self {
            config,
            beacon_state,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_genesis_state(self.config, &self.beacon_state)
    }

    pub fn set_genesis_time(&mut self, genesis_time: UnixSeconds) {
        self.beacon_state.genesis_time = genesis_time;
    }

    /// Registers a deposit of `amount` for `pubkey` and returns the index of its validator.
    ///
    /// A deposit for a known public key tops up the existing validator.
    /// Its withdrawal credentials are left unchanged.
    pub fn add_validator(
        &mut self,
        pubkey: PublicKeyBytes,
        withdrawal_credentials: H256,
        amount: Gwei,
    ) -> Result<ValidatorIndex> {
        let state = &mut self.beacon_state;

        let existing_index = state
            .validators()
            .iter()
            .position(|validator| validator.pubkey == pubkey);

        let validator_index = if let Some(position) = existing_index {
            let validator_index = position.try_into()?;
            let balance = state.registry.balance_mut(validator_index)?;

            *balance += amount;

            let balance = *balance;

            // Deposits at genesis are not followed by an epoch transition.
            // Effective balances have to be brought up to date here.
            state.registry.validator_mut(validator_index)?.effective_balance = balance
                .prev_multiple_of(P::EFFECTIVE_BALANCE_INCREMENT)
                .min(P::MAX_EFFECTIVE_BALANCE);

            validator_index
        } else {
            let validator_index = state.registry.len().try_into()?;
            let validator =
                Validator::create_pending_validator::<P>(pubkey, withdrawal_credentials, amount);

            state.registry.push(validator, amount);

            validator_index
        };

        // > Process genesis activations
        let validator = state.registry.validator_mut(validator_index)?;

        if validator.effective_balance == P::MAX_EFFECTIVE_BALANCE {
            *validator = activate_validator(*validator, GENESIS_EPOCH);
        }

        state.eth1_deposit_index += 1;
        state.eth1_data.deposit_count = state.eth1_deposit_index;

        Ok(validator_index)
    }

    pub fn finish(self, eth1_block_hash: H256) -> Result<BeaconState<P>> {
        let Self {
            mut beacon_state, ..
        } = self;

        beacon_state.eth1_data.block_hash = eth1_block_hash;

        let genesis_active_index_root = compute_active_index_root(&beacon_state, GENESIS_EPOCH);

        beacon_state.active_index_roots =
            PersistentVector::repeat_element(genesis_active_index_root);

        Ok(beacon_state)
    }
}

#[derive(Debug, Error)]
enum GenesisTriggerError {
    #[error("too early ({actual_genesis_time} < {minimum_genesis_time})")]
    TooEarly {
        minimum_genesis_time: UnixSeconds,
        actual_genesis_time: UnixSeconds,
    },
    #[error("not enough active validators ({actual_validator_count} < {minimum_validator_count})")]
    NotEnoughActiveValidators {
        minimum_validator_count: u64,
        actual_validator_count: u64,
    },
}

/// The block every node derives independently from the genesis state.
#[must_use]
pub fn beacon_block<P: Preset>(genesis_state: &BeaconState<P>) -> BeaconBlockHeader {
    BeaconBlockHeader {
        slot: GENESIS_SLOT,
        state_root: genesis_state.hash_tree_root(),
        ..BeaconBlockHeader::default()
    }
}

fn validate_genesis_state<P: Preset>(config: &Config, state: &BeaconState<P>) -> Result<()> {
    let minimum_genesis_time = config.min_genesis_time;
    let actual_genesis_time = state.genesis_time;

    ensure!(
        minimum_genesis_time <= actual_genesis_time,
        GenesisTriggerError::TooEarly {
            minimum_genesis_time,
            actual_genesis_time,
        },
    );

    let minimum_validator_count = config.min_genesis_active_validator_count;
    let actual_validator_count =
        get_active_validator_indices(state, GENESIS_EPOCH).count().try_into()?;

    ensure!(
        minimum_validator_count <= actual_validator_count,
        GenesisTriggerError::NotEnoughActiveValidators {
            minimum_validator_count,
            actual_validator_count,
        },
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use bls::SecretKey;
    use helper_functions::accessors::get_active_index_root;
    use test_case::test_case;
    use types::{phase0::consts::FAR_FUTURE_EPOCH, preset::Minimal};

    use super::*;

    const MAX: Gwei = Minimal::MAX_EFFECTIVE_BALANCE;

    fn pubkey(seed: u8) -> Result<PublicKeyBytes> {
        let mut bytes = [0; 32];
        bytes[31] = seed;
        Ok(SecretKey::try_from(bytes)?.to_public_key())
    }

    #[test]
    fn only_fully_funded_validators_are_activated() -> Result<()> {
        let config = Config::minimal();
        let mut incremental = Incremental::<Minimal>::new(&config);

        incremental.add_validator(pubkey(1)?, H256::zero(), MAX)?;
        incremental.add_validator(pubkey(2)?, H256::zero(), MAX - 1)?;
        incremental.add_validator(pubkey(3)?, H256::zero(), MAX + 5)?;

        let state = incremental.finish(H256::repeat_byte(0x42))?;

        let activation_epochs = state
            .validators()
            .iter()
            .map(|validator| validator.activation_epoch)
            .collect::<Vec<_>>();

        assert_eq!(activation_epochs, [GENESIS_EPOCH, FAR_FUTURE_EPOCH, GENESIS_EPOCH]);
        assert_eq!(state.registry.balance(2)?, MAX + 5);
        assert_eq!(state.eth1_data.block_hash, H256::repeat_byte(0x42));
        assert_eq!(state.eth1_data.deposit_count, 3);
        assert_eq!(state.eth1_deposit_index, 3);

        Ok(())
    }

    #[test]
    fn top_up_activates_validator_once_balance_is_maxed() -> Result<()> {
        let config = Config::minimal();
        let mut incremental = Incremental::<Minimal>::new(&config);

        let first = incremental.add_validator(pubkey(1)?, H256::zero(), MAX / 2)?;
        let second = incremental.add_validator(pubkey(1)?, H256::repeat_byte(1), MAX / 2)?;

        assert_eq!(first, second);

        let state = incremental.finish(H256::zero())?;
        let validator = state.registry.validator(0)?;

        assert_eq!(state.registry.len(), 1);
        assert_eq!(validator.activation_epoch, GENESIS_EPOCH);
        assert_eq!(validator.withdrawal_credentials, H256::zero());
        assert_eq!(state.registry.balance(0)?, MAX);

        Ok(())
    }

    #[test]
    fn active_index_roots_are_filled_with_genesis_root() -> Result<()> {
        let config = Config::minimal();
        let mut incremental = Incremental::<Minimal>::new(&config);

        for seed in 1..=4 {
            incremental.add_validator(pubkey(seed)?, H256::zero(), MAX)?;
        }

        let state = incremental.finish(H256::zero())?;
        let expected = vec![0_u64, 1, 2, 3].hash_tree_root();

        assert_eq!(get_active_index_root(&state, GENESIS_EPOCH), expected);
        assert!(state.active_index_roots.iter().all(|root| *root == expected));

        Ok(())
    }

    #[test_case(0, 64 => true; "enough validators after minimum time")]
    #[test_case(0, 63 => false; "too few validators")]
    #[test_case(1, 64 => false; "too early")]
    fn genesis_trigger(seconds_early: UnixSeconds, validator_count: u8) -> bool {
        let config = Config::minimal();
        let mut incremental = Incremental::<Minimal>::new(&config);

        incremental.set_genesis_time(config.min_genesis_time - seconds_early);

        for seed in 1..=validator_count {
            let pubkey = pubkey(seed).expect("small nonzero scalars are valid secret keys");

            incremental
                .add_validator(pubkey, H256::zero(), MAX)
                .expect("public keys are distinct");
        }

        incremental.validate().is_ok()
    }

    #[test]
    fn underfunded_validators_do_not_count_toward_genesis() -> Result<()> {
        let config = Config::minimal();
        let mut incremental = Incremental::<Minimal>::new(&config);

        incremental.set_genesis_time(config.min_genesis_time);

        for seed in 1..=64 {
            incremental.add_validator(pubkey(seed)?, H256::zero(), MAX - 1)?;
        }

        let error = incremental
            .validate()
            .expect_err("no validator has a full effective balance");

        assert!(matches!(
            error.downcast_ref(),
            Some(GenesisTriggerError::NotEnoughActiveValidators {
                actual_validator_count: 0,
                ..
            }),
        ));

        Ok(())
    }

    #[test]
    fn genesis_block_commits_to_state() -> Result<()> {
        let config = Config::minimal();
        let state = Incremental::<Minimal>::new(&config).finish(H256::zero())?;
        let block = beacon_block(&state);

        assert_eq!(block.slot, GENESIS_SLOT);
        assert_eq!(block.state_root, state.hash_tree_root());
        assert_eq!(block.parent_root, H256::zero());

        Ok(())
    }
}
