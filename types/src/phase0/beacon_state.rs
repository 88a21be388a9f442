use derivative::Derivative;
use serde::{Deserialize, Serialize};
use ssz::{SszHash, H256};
use typenum::U1;

use crate::{
    collections::{
        ActiveIndexRoots, Attestations, Balances, Crosslinks, Eth1DataVotes, HistoricalRoots,
        RandaoMixes, RecentRoots, SlashedBalances, Validators,
    },
    error::Error,
    phase0::{
        containers::{BeaconBlockHeader, Eth1Data, Fork, Validator},
        primitives::{Epoch, Gwei, Shard, Slot, UnixSeconds, ValidatorIndex},
    },
    preset::Preset,
};

#[derive(Derivative, Deserialize, Serialize)]
#[derivative(Clone(bound = ""), PartialEq(bound = ""), Eq(bound = ""), Default(bound = ""))]
#[derivative(Debug(bound = ""))]
#[serde(bound = "", deny_unknown_fields)]
pub struct BeaconState<P: Preset> {
    // > Versioning
    pub genesis_time: UnixSeconds,
    pub slot: Slot,
    pub fork: Fork,

    // > History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: RecentRoots<P>,
    pub state_roots: RecentRoots<P>,
    pub historical_roots: HistoricalRoots,

    // > Eth1
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: Eth1DataVotes,
    pub eth1_deposit_index: u64,

    // > Registry
    pub registry: ValidatorRegistry,

    // > Shuffling
    pub start_shard: Shard,
    pub randao_mixes: RandaoMixes<P>,
    pub active_index_roots: ActiveIndexRoots<P>,

    // > Slashings
    pub slashed_balances: SlashedBalances<P>,

    // > Attestations
    pub previous_epoch_attestations: Attestations,
    pub current_epoch_attestations: Attestations,

    // > Crosslinks
    pub previous_crosslinks: Crosslinks<P>,
    pub current_crosslinks: Crosslinks<P>,

    // > Justification
    pub previous_justified_epoch: Epoch,
    pub previous_justified_root: H256,
    pub current_justified_epoch: Epoch,
    pub current_justified_root: H256,
    pub justification_bitfield: u64,

    // > Finality
    pub finalized_epoch: Epoch,
    pub finalized_root: H256,
}

impl<P: Preset> SszHash for BeaconState<P> {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        ssz::merkleize_fields([
            self.genesis_time.hash_tree_root(),
            self.slot.hash_tree_root(),
            self.fork.hash_tree_root(),
            self.latest_block_header.hash_tree_root(),
            self.block_roots.hash_tree_root(),
            self.state_roots.hash_tree_root(),
            self.historical_roots.hash_tree_root(),
            self.eth1_data.hash_tree_root(),
            self.eth1_data_votes.hash_tree_root(),
            self.eth1_deposit_index.hash_tree_root(),
            self.registry.validators.hash_tree_root(),
            self.registry.balances.hash_tree_root(),
            self.start_shard.hash_tree_root(),
            self.randao_mixes.hash_tree_root(),
            self.active_index_roots.hash_tree_root(),
            self.slashed_balances.hash_tree_root(),
            self.previous_epoch_attestations.hash_tree_root(),
            self.current_epoch_attestations.hash_tree_root(),
            self.previous_crosslinks.hash_tree_root(),
            self.current_crosslinks.hash_tree_root(),
            self.previous_justified_epoch.hash_tree_root(),
            self.previous_justified_root.hash_tree_root(),
            self.current_justified_epoch.hash_tree_root(),
            self.current_justified_root.hash_tree_root(),
            self.justification_bitfield.hash_tree_root(),
            self.finalized_epoch.hash_tree_root(),
            self.finalized_root.hash_tree_root(),
        ])
    }
}

impl<P: Preset> BeaconState<P> {
    #[inline]
    #[must_use]
    pub const fn validators(&self) -> &Validators {
        self.registry.validators()
    }

    #[inline]
    #[must_use]
    pub const fn balances(&self) -> &Balances {
        self.registry.balances()
    }
}

/// Validators and their balances.
///
/// Kept in one value so that the two lists cannot diverge in length.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(try_from = "RegistryParts")]
pub struct ValidatorRegistry {
    validators: Validators,
    balances: Balances,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryParts {
    validators: Validators,
    balances: Balances,
}

impl TryFrom<RegistryParts> for ValidatorRegistry {
    type Error = Error;

    fn try_from(parts: RegistryParts) -> Result<Self, Self::Error> {
        Self::new(parts.validators, parts.balances)
    }
}

impl ValidatorRegistry {
    pub fn new(validators: Validators, balances: Balances) -> Result<Self, Error> {
        if validators.len() != balances.len() {
            return Err(Error::RegistryLengthMismatch {
                validators: validators.len(),
                balances: balances.len(),
            });
        }

        Ok(Self {
            validators,
            balances,
        })
    }

    #[inline]
    #[must_use]
    pub const fn validators(&self) -> &Validators {
        &self.validators
    }

    #[inline]
    #[must_use]
    pub const fn balances(&self) -> &Balances {
        &self.balances
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn push(&mut self, validator: Validator, balance: Gwei) {
        self.validators.push(validator);
        self.balances.push(balance);
    }

    pub fn validator(&self, index: ValidatorIndex) -> Result<&Validator, ssz::Error> {
        self.validators.get(index)
    }

    pub fn validator_mut(&mut self, index: ValidatorIndex) -> Result<&mut Validator, ssz::Error> {
        self.validators.get_mut(index)
    }

    pub fn balance(&self, index: ValidatorIndex) -> Result<Gwei, ssz::Error> {
        self.balances.get(index).copied()
    }

    pub fn balance_mut(&mut self, index: ValidatorIndex) -> Result<&mut Gwei, ssz::Error> {
        // Balances are only reachable through validator indices.
        self.validators.get(index)?;
        self.balances.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&mut Validator, &mut Gwei)> {
        self.validators.iter_mut().zip(self.balances.iter_mut())
    }

    pub fn update_validator(
        &self,
        index: ValidatorIndex,
        function: impl FnOnce(&Validator) -> Validator,
    ) -> Result<Self, ssz::Error> {
        Ok(Self {
            validators: self.validators.update_with(index, function)?,
            balances: self.balances.clone(),
        })
    }

    pub fn update_balance(
        &self,
        index: ValidatorIndex,
        function: impl FnOnce(Gwei) -> Gwei,
    ) -> Result<Self, ssz::Error> {
        self.validators.get(index)?;

        Ok(Self {
            validators: self.validators.clone(),
            balances: self.balances.update_with(index, |balance| function(*balance))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use bls::PublicKeyBytes;

    use crate::preset::Minimal;

    use super::*;

    fn registry(balances: &[Gwei]) -> anyhow::Result<ValidatorRegistry> {
        let validators = balances
            .iter()
            .map(|amount| {
                Validator::create_pending_validator::<Minimal>(
                    PublicKeyBytes::zero(),
                    H256::zero(),
                    *amount,
                )
            })
            .collect();

        Ok(ValidatorRegistry::new(
            validators,
            balances.iter().copied().collect(),
        )?)
    }

    #[test]
    fn registry_rejects_length_mismatch() {
        let result = ValidatorRegistry::new(
            core::iter::once(Validator::default()).collect(),
            Balances::default(),
        );

        assert_eq!(
            result,
            Err(Error::RegistryLengthMismatch {
                validators: 1,
                balances: 0,
            }),
        );
    }

    #[test]
    fn registry_deserialization_checks_lengths() {
        let json = r#"{"validators": [], "balances": [1]}"#;

        assert!(serde_json::from_str::<ValidatorRegistry>(json).is_err());
    }

    #[test]
    fn update_balance_leaves_original_untouched() -> anyhow::Result<()> {
        let original = registry(&[10, 20, 30])?;
        let updated = original.update_balance(1, |balance| balance + 5)?;

        assert_eq!(original.balance(1)?, 20);
        assert_eq!(updated.balance(1)?, 25);
        assert_eq!(updated.validators(), original.validators());

        Ok(())
    }

    #[test]
    fn update_balance_rejects_unknown_index() -> anyhow::Result<()> {
        let registry = registry(&[10])?;

        assert_eq!(
            registry.update_balance(1, |balance| balance),
            Err(ssz::Error::IndexOutOfBounds {
                index: 1,
                length: 1,
            }),
        );

        Ok(())
    }

    #[test]
    fn cloned_state_is_independent() -> anyhow::Result<()> {
        let original = BeaconState::<Minimal> {
            registry: registry(&[32_000_000_000; 4])?,
            ..BeaconState::default()
        };

        let mut modified = original.clone();
        *modified.registry.balance_mut(2)? = 0;
        modified.slot = 5;

        assert_eq!(original.balances().get(2)?, &32_000_000_000);
        assert_eq!(original.slot, 0);
        assert_ne!(original.hash_tree_root(), modified.hash_tree_root());

        Ok(())
    }

    #[test]
    fn state_round_trips_through_json() -> anyhow::Result<()> {
        let state = BeaconState::<Minimal> {
            slot: 17,
            registry: registry(&[1, 2])?,
            ..BeaconState::default()
        };

        let json = serde_json::to_string(&state)?;
        let decoded = serde_json::from_str::<BeaconState<Minimal>>(&json)?;

        assert_eq!(decoded, state);
        assert_eq!(decoded.hash_tree_root(), state.hash_tree_root());

        Ok(())
    }
}
