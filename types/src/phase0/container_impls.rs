use bls::PublicKeyBytes;
use ssz::{SszHash, H256};
use typenum::U1;

use crate::{
    phase0::{
        consts::FAR_FUTURE_EPOCH,
        containers::{
            Attestation, AttestationData, AttestationDataAndCustodyBit, AttesterSlashing,
            BeaconBlockHeader, Crosslink, Eth1Data, Fork, HistoricalBatch, IndexedAttestation,
            PendingAttestation, ProposerSlashing, Validator, VoluntaryExit,
        },
        primitives::Gwei,
    },
    preset::Preset,
};

// Containers are hashed by merkleizing the roots of their fields in declaration order.
macro_rules! impl_ssz_hash {
    ($container: ident $(<$preset: ident>)? { $($field: ident),+ $(,)? }) => {
        impl $(<$preset: Preset>)? SszHash for $container $(<$preset>)? {
            type PackingFactor = U1;

            fn hash_tree_root(&self) -> H256 {
                ssz::merkleize_fields([$(self.$field.hash_tree_root()),+])
            }
        }
    };
}

impl_ssz_hash!(Attestation {
    aggregation_bitfield,
    data,
    custody_bitfield,
    signature,
});

impl_ssz_hash!(AttestationData {
    beacon_block_root,
    source_epoch,
    source_root,
    target_epoch,
    target_root,
    crosslink,
});

impl_ssz_hash!(AttestationDataAndCustodyBit { data, custody_bit });

impl_ssz_hash!(AttesterSlashing {
    attestation_1,
    attestation_2,
});

impl_ssz_hash!(BeaconBlockHeader {
    slot,
    parent_root,
    state_root,
    body_root,
    signature,
});

impl_ssz_hash!(Crosslink {
    shard,
    start_epoch,
    end_epoch,
    parent_root,
    data_root,
});

impl_ssz_hash!(Eth1Data {
    block_hash,
    deposit_root,
    deposit_count,
});

impl_ssz_hash!(Fork {
    previous_version,
    current_version,
    epoch,
});

impl_ssz_hash!(HistoricalBatch<P> {
    block_roots,
    state_roots,
});

impl_ssz_hash!(IndexedAttestation {
    custody_bit_0_indices,
    custody_bit_1_indices,
    data,
    signature,
});

impl_ssz_hash!(PendingAttestation {
    aggregation_bitfield,
    data,
    inclusion_delay,
    proposer_index,
});

impl_ssz_hash!(ProposerSlashing {
    proposer_index,
    header_1,
    header_2,
});

impl_ssz_hash!(Validator {
    pubkey,
    withdrawal_credentials,
    activation_eligibility_epoch,
    activation_epoch,
    exit_epoch,
    withdrawable_epoch,
    slashed,
    effective_balance,
});

impl_ssz_hash!(VoluntaryExit {
    epoch,
    validator_index,
    signature,
});

impl BeaconBlockHeader {
    /// Root of the header without its signature. This is the root the signature is made over
    /// and the root blocks are identified by.
    #[must_use]
    pub fn signing_root(&self) -> H256 {
        ssz::merkleize_fields([
            self.slot.hash_tree_root(),
            self.parent_root.hash_tree_root(),
            self.state_root.hash_tree_root(),
            self.body_root.hash_tree_root(),
        ])
    }
}

impl VoluntaryExit {
    #[must_use]
    pub fn signing_root(&self) -> H256 {
        ssz::merkleize_fields([
            self.epoch.hash_tree_root(),
            self.validator_index.hash_tree_root(),
        ])
    }
}

impl Validator {
    /// Creates a validator that is not yet eligible for activation.
    ///
    /// The effective balance is `amount` rounded down to a whole increment and capped at
    /// `MAX_EFFECTIVE_BALANCE`.
    #[must_use]
    pub fn create_pending_validator<P: Preset>(
        pubkey: PublicKeyBytes,
        withdrawal_credentials: H256,
        amount: Gwei,
    ) -> Self {
        let effective_balance = (amount - amount % P::EFFECTIVE_BALANCE_INCREMENT)
            .min(P::MAX_EFFECTIVE_BALANCE);

        Self {
            pubkey,
            withdrawal_credentials,
            activation_eligibility_epoch: FAR_FUTURE_EPOCH,
            activation_epoch: FAR_FUTURE_EPOCH,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
            slashed: false,
            effective_balance,
        }
    }
}
