use thiserror::Error;
use types::phase0::{
    containers::{AttestationData, BeaconBlockHeader},
    primitives::{Epoch, Shard, Slot, ValidatorIndex, H256},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("attestation data is not slashable (data_1: {data_1:?}, data_2: {data_2:?})")]
    AttestationDataNotSlashable {
        data_1: AttestationData,
        data_2: AttestationData,
    },
    #[error(
        "attestation in slot {attestation_slot} is outside \
         inclusion range for state at slot {state_slot}"
    )]
    AttestationOutsideInclusionRange {
        state_slot: Slot,
        attestation_slot: Slot,
    },
    #[error(
        "attestation source does not match justified checkpoint \
         (in_state: {in_state:?}, in_block: {in_block:?})"
    )]
    AttestationSourceMismatch {
        in_state: (Epoch, H256),
        in_block: (Epoch, H256),
    },
    #[error("crosslink data root is not zero: {in_block:?}")]
    CrosslinkDataRootNotZero { in_block: H256 },
    #[error("crosslink end epoch is incorrect (computed: {computed}, in_block: {in_block})")]
    CrosslinkEndEpochMismatch { computed: Epoch, in_block: Epoch },
    #[error("crosslink parent root is incorrect (computed: {computed:?}, in_block: {in_block:?})")]
    CrosslinkParentRootMismatch { computed: H256, in_block: H256 },
    #[error("crosslink shard {shard} is out of range")]
    CrosslinkShardOutOfRange { shard: Shard },
    #[error("crosslink start epoch is incorrect (computed: {computed}, in_block: {in_block})")]
    CrosslinkStartEpochMismatch { computed: Epoch, in_block: Epoch },
    #[error("block signature is invalid (proposer_index: {proposer_index})")]
    InvalidBlockSignature { proposer_index: ValidatorIndex },
    #[error("RANDAO reveal is invalid (proposer_index: {proposer_index})")]
    InvalidRandaoReveal { proposer_index: ValidatorIndex },
    #[error("voluntary exit signature is invalid (validator_index: {validator_index})")]
    InvalidVoluntaryExitSignature { validator_index: ValidatorIndex },
    #[error("no attesters slashed")]
    NoAttestersSlashed,
    #[error("parent root is incorrect (computed: {computed:?}, in_block: {in_block:?})")]
    ParentRootMismatch { computed: H256, in_block: H256 },
    #[error("proposer {index} is not slashable")]
    ProposerNotSlashable { index: ValidatorIndex },
    #[error("attestation credits proposer {proposer_index} that does not exist")]
    ProposerIndexOutOfBounds { proposer_index: ValidatorIndex },
    #[error("proposer {index} is slashed")]
    ProposerSlashed { index: ValidatorIndex },
    #[error("proposer slashing headers are from different epochs ({epoch_1} != {epoch_2})")]
    ProposerSlashingEpochMismatch { epoch_1: Epoch, epoch_2: Epoch },
    #[error("proposer slashing headers are identical: {header:?}")]
    ProposerSlashingHeadersIdentical { header: BeaconBlockHeader },
    #[error("block slot ({block_slot}) does not match state slot ({state_slot})")]
    SlotMismatch { state_slot: Slot, block_slot: Slot },
    #[error("target slot ({target}) is not later than current slot ({current})")]
    SlotNotLater { current: Slot, target: Slot },
    #[error("validator {index} has already initiated exit (exit_epoch: {exit_epoch})")]
    ValidatorAlreadyExited { index: ValidatorIndex, exit_epoch: Epoch },
    #[error(
        "validator {index} has not been active long enough \
         (activation_epoch: {activation_epoch}, current_epoch: {current_epoch})"
    )]
    ValidatorHasNotBeenActiveLongEnough {
        index: ValidatorIndex,
        activation_epoch: Epoch,
        current_epoch: Epoch,
    },
    #[error("validator {index} is not active in epoch {current_epoch}")]
    ValidatorNotActive {
        index: ValidatorIndex,
        current_epoch: Epoch,
    },
    #[error("voluntary exit is not valid until epoch {epoch} (current_epoch: {current_epoch})")]
    VoluntaryExitNotYetValid { current_epoch: Epoch, epoch: Epoch },
}
